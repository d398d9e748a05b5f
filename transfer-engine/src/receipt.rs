use core_types::{OrgId, WarehouseId, WasteCategory};
use serde::{Deserialize, Serialize};

/// One committed delivery line: which warehouse takes how much, and how far
/// away it sits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub warehouse_id: WarehouseId,
    pub warehouse_name: String,
    pub delivered_quantity: u32,
    pub distance: u32,
}

/// The committed allocation plan for one shipment. Lines appear in delivery
/// order: ascending distance, ties broken by warehouse id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub organization_id: OrgId,
    #[serde(rename = "waste_type")]
    pub category: WasteCategory,
    pub initial_quantity: u32,
    pub transfer_data: Vec<TransferLine>,
}

impl TransferReceipt {
    /// Total quantity across all lines; equals `initial_quantity` for every
    /// committed receipt.
    pub fn delivered_total(&self) -> u32 {
        self.transfer_data
            .iter()
            .map(|line| line.delivered_quantity)
            .sum()
    }
}
