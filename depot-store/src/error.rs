use std::io;

use core_types::{OrgId, ReservationId, WarehouseId, WasteCategory};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("organization {org_id} not found")]
    UnknownOrganization { org_id: OrgId },
    #[error("warehouse {warehouse_id} not found")]
    UnknownWarehouse { warehouse_id: WarehouseId },
    #[error("reservation {reservation_id} not found")]
    UnknownReservation { reservation_id: ReservationId },
    /// A decrement would drive a counter negative. The allocator's own
    /// `min(capacity, remaining)` makes this unreachable; the state refuses
    /// the write before mutating anything.
    #[error(
        "capacity underflow at warehouse {warehouse_id} ({category:?}): \
         removing {amount} from remaining {remaining}"
    )]
    CapacityUnderflow {
        warehouse_id: WarehouseId,
        category: WasteCategory,
        amount: u32,
        remaining: u32,
    },
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("state file corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
