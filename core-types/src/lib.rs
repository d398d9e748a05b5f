//! Shared ids, enums, and entity rows for the waste capacity system.

pub mod types;

pub use types::{
    AvailabilityEdge, CapacityLimits, Organization, OrgId, Reservation, ReservationId,
    ReservationPatch, UnknownCategory, Warehouse, WarehouseId, WasteCategory,
};
