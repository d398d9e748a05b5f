//! Demo fixtures: a small warehouse network with uneven limits and
//! distances, used by the dev seeding route and by tests.

use log::info;

use crate::{error::Result, store::DepotStore};
use core_types::CapacityLimits;

const DEPOTS: &[(&str, u32, u32, u32)] = &[
    ("Depot 1", 0, 100, 300),
    ("Depot 2", 150, 50, 0),
    ("Depot 3", 250, 10, 0),
    ("Depot 5", 25, 0, 220),
    ("Depot 6", 150, 0, 100),
    ("Depot 7", 250, 100, 0),
    ("Depot 8", 52, 25, 35),
    ("Depot 9", 20, 250, 0),
];

const ORG_EDGES: &[(&str, &[(usize, u32)])] = &[
    (
        "Org 1",
        &[
            (0, 100),
            (1, 50),
            (2, 600),
            (3, 100),
            (4, 1200),
            (5, 650),
            (6, 600),
            (7, 610),
        ],
    ),
    ("Org 2", &[(2, 50), (4, 650), (5, 100)]),
];

/// Inserts the demo network unless the store already holds organizations.
/// Returns whether anything was seeded.
pub fn seed_demo(store: &DepotStore) -> Result<bool> {
    let seeded = store.transaction(|state| -> Result<bool> {
        if state.organizations().next().is_some() {
            return Ok(false);
        }
        let mut warehouse_ids = Vec::with_capacity(DEPOTS.len());
        for (name, bio, plastic, glass) in DEPOTS {
            let warehouse = state.insert_warehouse(
                (*name).to_string(),
                CapacityLimits::new(*bio, *plastic, *glass),
            );
            warehouse_ids.push(warehouse.id);
        }
        for (name, edges) in ORG_EDGES {
            let reachable: Vec<_> = edges
                .iter()
                .map(|(index, distance)| (warehouse_ids[*index], *distance))
                .collect();
            state.insert_organization((*name).to_string(), &reachable)?;
        }
        Ok(true)
    })?;
    if seeded {
        info!(
            "seeded demo fixtures: {} warehouses, {} organizations",
            DEPOTS.len(),
            ORG_EDGES.len()
        );
    }
    Ok(seeded)
}

#[cfg(test)]
mod tests {
    use core_types::WasteCategory;
    use tempfile::tempdir;

    use super::*;
    use crate::config::StoreConfig;

    #[test]
    fn seeding_is_skipped_when_rows_exist() {
        let dir = tempdir().unwrap();
        let store = DepotStore::open(&StoreConfig::new(dir.path().to_path_buf())).unwrap();
        assert!(seed_demo(&store).unwrap());
        assert!(!seed_demo(&store).unwrap());

        store.read(|state| {
            assert_eq!(state.organizations().count(), 2);
            assert_eq!(state.edges_for(1).len(), 8);
            assert_eq!(state.edges_for(2).len(), 3);
            // Depot 2 sits 50 away from Org 1 with 150 bio capacity.
            let edge = state.edges_for(1)[1];
            assert_eq!(edge.warehouse_id, 2);
            assert_eq!(edge.distance, 50);
            assert_eq!(
                state.warehouse(2).unwrap().limits.get(WasteCategory::Bio),
                150
            );
        });
    }
}
