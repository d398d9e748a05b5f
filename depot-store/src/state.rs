use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use core_types::{
    AvailabilityEdge, CapacityLimits, Organization, OrgId, Reservation, ReservationId, Warehouse,
    WarehouseId, WasteCategory,
};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// In-memory image of the state file. All mutation happens on a working copy
/// inside [`crate::DepotStore::transaction`]; nothing here touches disk.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DepotState {
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    organizations: BTreeMap<OrgId, Organization>,
    edges: Vec<AvailabilityEdge>,
    reservations: BTreeMap<ReservationId, Reservation>,
    next_warehouse_id: WarehouseId,
    next_org_id: OrgId,
    next_reservation_id: ReservationId,
}

impl DepotState {
    pub fn is_empty(&self) -> bool {
        self.warehouses.is_empty()
            && self.organizations.is_empty()
            && self.reservations.is_empty()
    }

    pub fn warehouse(&self, warehouse_id: WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(&warehouse_id)
    }

    pub fn warehouses(&self) -> impl Iterator<Item = &Warehouse> {
        self.warehouses.values()
    }

    pub fn organization(&self, org_id: OrgId) -> Option<&Organization> {
        self.organizations.get(&org_id)
    }

    pub fn organizations(&self) -> impl Iterator<Item = &Organization> {
        self.organizations.values()
    }

    pub fn reservation(&self, reservation_id: ReservationId) -> Option<&Reservation> {
        self.reservations.get(&reservation_id)
    }

    pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values()
    }

    /// Availability edges for one organization, in edge-creation order.
    pub fn edges_for(&self, org_id: OrgId) -> Vec<AvailabilityEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.org_id == org_id)
            .copied()
            .collect()
    }

    /// Edges pointing at one warehouse, for the per-warehouse distance view.
    pub fn edges_to(&self, warehouse_id: WarehouseId) -> Vec<AvailabilityEdge> {
        self.edges
            .iter()
            .filter(|edge| edge.warehouse_id == warehouse_id)
            .copied()
            .collect()
    }

    pub fn insert_warehouse(&mut self, name: String, limits: CapacityLimits) -> Warehouse {
        self.next_warehouse_id += 1;
        let warehouse = Warehouse {
            id: self.next_warehouse_id,
            name,
            limits,
        };
        self.warehouses.insert(warehouse.id, warehouse.clone());
        warehouse
    }

    /// Creates an organization together with all of its availability edges.
    /// Every referenced warehouse is checked before anything is inserted, so
    /// an unknown id fails the whole creation.
    pub fn insert_organization(
        &mut self,
        name: String,
        reachable: &[(WarehouseId, u32)],
    ) -> Result<Organization> {
        for (warehouse_id, _) in reachable {
            if !self.warehouses.contains_key(warehouse_id) {
                return Err(StoreError::UnknownWarehouse {
                    warehouse_id: *warehouse_id,
                });
            }
        }
        self.next_org_id += 1;
        let organization = Organization {
            id: self.next_org_id,
            name,
        };
        self.organizations
            .insert(organization.id, organization.clone());
        for (warehouse_id, distance) in reachable {
            self.edges.push(AvailabilityEdge {
                org_id: organization.id,
                warehouse_id: *warehouse_id,
                distance: *distance,
            });
        }
        Ok(organization)
    }

    pub fn insert_reservation(
        &mut self,
        from_org: OrgId,
        to_warehouse: WarehouseId,
        category: WasteCategory,
        quantity: u32,
        date: DateTime<Utc>,
    ) -> Reservation {
        self.next_reservation_id += 1;
        let reservation = Reservation {
            id: self.next_reservation_id,
            from_org,
            to_warehouse,
            category,
            quantity,
            date,
            accepted: true,
        };
        self.reservations.insert(reservation.id, reservation.clone());
        reservation
    }

    pub fn update_reservation(&mut self, reservation: Reservation) -> Result<()> {
        let slot = self
            .reservations
            .get_mut(&reservation.id)
            .ok_or(StoreError::UnknownReservation {
                reservation_id: reservation.id,
            })?;
        *slot = reservation;
        Ok(())
    }

    /// Checked decrement: validates before mutating, so a refused write has
    /// no side effect.
    pub fn decrement_capacity(
        &mut self,
        warehouse_id: WarehouseId,
        category: WasteCategory,
        amount: u32,
    ) -> Result<()> {
        let warehouse = self
            .warehouses
            .get_mut(&warehouse_id)
            .ok_or(StoreError::UnknownWarehouse { warehouse_id })?;
        let remaining = warehouse.limits.get(category);
        if amount > remaining {
            return Err(StoreError::CapacityUnderflow {
                warehouse_id,
                category,
                amount,
                remaining,
            });
        }
        *warehouse.limits.get_mut(category) = remaining - amount;
        Ok(())
    }

    pub fn increment_capacity(
        &mut self,
        warehouse_id: WarehouseId,
        category: WasteCategory,
        amount: u32,
    ) -> Result<()> {
        let warehouse = self
            .warehouses
            .get_mut(&warehouse_id)
            .ok_or(StoreError::UnknownWarehouse { warehouse_id })?;
        let counter = warehouse.limits.get_mut(category);
        *counter = counter.saturating_add(amount);
        Ok(())
    }

    pub fn clear(&mut self) {
        *self = DepotState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_creation_is_all_or_nothing() {
        let mut state = DepotState::default();
        let warehouse = state.insert_warehouse("north".to_string(), CapacityLimits::new(10, 0, 0));

        let err = state
            .insert_organization("acme".to_string(), &[(warehouse.id, 5), (999, 7)])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::UnknownWarehouse { warehouse_id: 999 }
        ));
        assert!(state.organizations().next().is_none());
        assert!(state.edges_for(1).is_empty());
    }

    #[test]
    fn decrement_refuses_underflow_without_side_effect() {
        let mut state = DepotState::default();
        let warehouse = state.insert_warehouse("north".to_string(), CapacityLimits::new(10, 0, 0));

        let err = state
            .decrement_capacity(warehouse.id, WasteCategory::Bio, 11)
            .unwrap_err();
        assert!(matches!(err, StoreError::CapacityUnderflow { remaining: 10, .. }));
        assert_eq!(
            state.warehouse(warehouse.id).unwrap().limits.get(WasteCategory::Bio),
            10
        );

        state
            .decrement_capacity(warehouse.id, WasteCategory::Bio, 10)
            .unwrap();
        assert_eq!(
            state.warehouse(warehouse.id).unwrap().limits.get(WasteCategory::Bio),
            0
        );
    }

    #[test]
    fn reservation_ids_are_sequential() {
        let mut state = DepotState::default();
        let warehouse = state.insert_warehouse("north".to_string(), CapacityLimits::new(50, 0, 0));
        let org = state
            .insert_organization("acme".to_string(), &[(warehouse.id, 5)])
            .unwrap();

        let now = Utc::now();
        let first =
            state.insert_reservation(org.id, warehouse.id, WasteCategory::Bio, 10, now);
        let second =
            state.insert_reservation(org.id, warehouse.id, WasteCategory::Bio, 20, now);
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.accepted);
    }
}
