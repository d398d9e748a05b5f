use core_types::{OrgId, ReservationId, WarehouseId};
use depot_store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("invalid waste category {value:?}; use 'glass', 'plastic' or 'bio'")]
    InvalidCategory { value: String },
    #[error("organization {org_id} has no available warehouses")]
    NoAvailableWarehouses { org_id: OrgId },
    #[error(
        "cannot place {unmet} of {requested} waste units: \
         not enough room in the available warehouses"
    )]
    InsufficientCapacity { requested: u32, unmet: u32 },
    #[error("reservation {reservation_id} not found")]
    ReservationNotFound { reservation_id: ReservationId },
    #[error("warehouse {warehouse_id} not found")]
    WarehouseNotFound { warehouse_id: WarehouseId },
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
