use std::sync::Arc;

use chrono::Utc;
use core_types::{OrgId, Reservation, ReservationId, ReservationPatch, WasteCategory};
use depot_store::{DepotState, DepotStore, StoreError};
use log::info;

use crate::{
    error::{Result, TransferError},
    receipt::{TransferLine, TransferReceipt},
};

/// High-level API over the depot store: shipment allocation and reservation
/// reversal. Stateless between calls; the store handle is the only
/// dependency.
pub struct TransferController {
    store: Arc<DepotStore>,
}

/// Result of a reservation patch. `capacity_restored` is true only when this
/// call flipped `accepted` from true to false and credited the warehouse.
#[derive(Clone, Debug)]
pub struct ReversalOutcome {
    pub reservation: Reservation,
    pub capacity_restored: bool,
}

impl TransferController {
    pub fn new(store: Arc<DepotStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<DepotStore> {
        Arc::clone(&self.store)
    }

    /// Distributes `quantity` units of `waste_type` across the reachable
    /// warehouses of `org_id`, nearest first. Commits every capacity
    /// decrement plus one reservation row per warehouse touched, or nothing.
    pub fn transfer_waste(
        &self,
        org_id: OrgId,
        waste_type: &str,
        quantity: u32,
    ) -> Result<TransferReceipt> {
        let category: WasteCategory =
            waste_type
                .parse()
                .map_err(|err: core_types::UnknownCategory| TransferError::InvalidCategory {
                    value: err.value,
                })?;

        let receipt = self.store.transaction(|state| -> Result<TransferReceipt> {
            let plan = plan_allocation(state, org_id, category, quantity)?;
            let now = Utc::now();
            for line in &plan {
                state.decrement_capacity(line.warehouse_id, category, line.delivered_quantity)?;
                state.insert_reservation(
                    org_id,
                    line.warehouse_id,
                    category,
                    line.delivered_quantity,
                    now,
                );
            }
            Ok(TransferReceipt {
                organization_id: org_id,
                category,
                initial_quantity: quantity,
                transfer_data: plan,
            })
        })?;

        info!(
            "org {} shipped {} {} units across {} warehouses",
            org_id,
            quantity,
            category.label(),
            receipt.transfer_data.len()
        );
        Ok(receipt)
    }

    /// Applies a sparse patch to one reservation. Capacity flows back to the
    /// warehouse only on a true-to-false transition of `accepted`; patching
    /// an already-rejected reservation again does not credit twice.
    pub fn set_accepted(
        &self,
        reservation_id: ReservationId,
        patch: &ReservationPatch,
    ) -> Result<ReversalOutcome> {
        let outcome = self.store.transaction(|state| -> Result<ReversalOutcome> {
            let mut reservation = state
                .reservation(reservation_id)
                .cloned()
                .ok_or(TransferError::ReservationNotFound { reservation_id })?;
            let was_accepted = reservation.accepted;

            if let Some(date) = patch.date {
                reservation.date = date;
            }
            if let Some(accepted) = patch.accepted {
                reservation.accepted = accepted;
            }

            let capacity_restored = was_accepted && !reservation.accepted;
            if capacity_restored {
                state
                    .increment_capacity(
                        reservation.to_warehouse,
                        reservation.category,
                        reservation.quantity,
                    )
                    .map_err(|err| match err {
                        StoreError::UnknownWarehouse { warehouse_id } => {
                            TransferError::WarehouseNotFound { warehouse_id }
                        }
                        other => TransferError::Store(other),
                    })?;
            }
            state.update_reservation(reservation.clone())?;
            Ok(ReversalOutcome {
                reservation,
                capacity_restored,
            })
        })?;

        if outcome.capacity_restored {
            info!(
                "reservation {} rejected; returned {} {} units to warehouse {}",
                reservation_id,
                outcome.reservation.quantity,
                outcome.reservation.category.label(),
                outcome.reservation.to_warehouse
            );
        }
        Ok(outcome)
    }
}

/// Greedy nearest-first plan against the given state snapshot. Pure reads:
/// the caller applies the plan only once it is complete.
fn plan_allocation(
    state: &DepotState,
    org_id: OrgId,
    category: WasteCategory,
    quantity: u32,
) -> Result<Vec<TransferLine>> {
    let mut edges = state.edges_for(org_id);
    if edges.is_empty() {
        return Err(TransferError::NoAvailableWarehouses { org_id });
    }
    edges.sort_by_key(|edge| (edge.distance, edge.warehouse_id));

    let mut remaining = quantity;
    let mut plan = Vec::new();
    for edge in &edges {
        if remaining == 0 {
            break;
        }
        let warehouse =
            state
                .warehouse(edge.warehouse_id)
                .ok_or(StoreError::UnknownWarehouse {
                    warehouse_id: edge.warehouse_id,
                })?;
        let available = warehouse.limits.get(category);
        if available == 0 {
            continue;
        }
        let delivered = available.min(remaining);
        plan.push(TransferLine {
            warehouse_id: warehouse.id,
            warehouse_name: warehouse.name.clone(),
            delivered_quantity: delivered,
            distance: edge.distance,
        });
        remaining -= delivered;
    }

    if remaining > 0 {
        return Err(TransferError::InsufficientCapacity {
            requested: quantity,
            unmet: remaining,
        });
    }
    Ok(plan)
}
