use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type OrgId = u32;
pub type WarehouseId = u32;
pub type ReservationId = u32;

/// Waste categories a warehouse tracks an independent limit for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WasteCategory {
    Bio,
    Plastic,
    Glass,
}

impl WasteCategory {
    pub const ALL: [Self; 3] = [WasteCategory::Bio, WasteCategory::Plastic, WasteCategory::Glass];

    pub fn label(&self) -> &'static str {
        match self {
            WasteCategory::Bio => "bio",
            WasteCategory::Plastic => "plastic",
            WasteCategory::Glass => "glass",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown waste category {value:?}; use 'glass', 'plastic' or 'bio'")]
pub struct UnknownCategory {
    pub value: String,
}

impl FromStr for WasteCategory {
    type Err = UnknownCategory;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "bio" => Ok(WasteCategory::Bio),
            "plastic" => Ok(WasteCategory::Plastic),
            "glass" => Ok(WasteCategory::Glass),
            other => Err(UnknownCategory {
                value: other.to_string(),
            }),
        }
    }
}

/// Remaining capacity per category at one warehouse. Counters are unsigned,
/// so a negative limit is unrepresentable; mutation goes through the typed
/// accessors below rather than by-name field lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityLimits {
    pub bio_limit: u32,
    pub plastic_limit: u32,
    pub glass_limit: u32,
}

impl CapacityLimits {
    pub fn new(bio_limit: u32, plastic_limit: u32, glass_limit: u32) -> Self {
        Self {
            bio_limit,
            plastic_limit,
            glass_limit,
        }
    }

    pub fn get(&self, category: WasteCategory) -> u32 {
        match category {
            WasteCategory::Bio => self.bio_limit,
            WasteCategory::Plastic => self.plastic_limit,
            WasteCategory::Glass => self.glass_limit,
        }
    }

    pub fn get_mut(&mut self, category: WasteCategory) -> &mut u32 {
        match category {
            WasteCategory::Bio => &mut self.bio_limit,
            WasteCategory::Plastic => &mut self.plastic_limit,
            WasteCategory::Glass => &mut self.glass_limit,
        }
    }
}

/// Warehouse row: identity plus the three live capacity counters.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    #[serde(flatten)]
    pub limits: CapacityLimits,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Organization {
    pub id: OrgId,
    pub name: String,
}

/// Fixed (organization, warehouse, distance) relation. Created with the
/// organization, immutable afterwards; defines reachability and the
/// nearest-first traversal order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AvailabilityEdge {
    pub org_id: OrgId,
    pub warehouse_id: WarehouseId,
    pub distance: u32,
}

/// One committed delivery of a sub-quantity to one warehouse. `accepted`
/// starts true; flipping it to false returns the quantity to the warehouse.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub from_org: OrgId,
    pub to_warehouse: WarehouseId,
    #[serde(rename = "waste_type")]
    pub category: WasteCategory,
    pub quantity: u32,
    pub date: DateTime<Utc>,
    pub accepted: bool,
}

/// Sparse update for a reservation: absent fields are left untouched.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ReservationPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

impl ReservationPatch {
    pub fn accept(accepted: bool) -> Self {
        Self {
            accepted: Some(accepted),
            date: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.accepted.is_none() && self.date.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_round_trip() {
        for category in WasteCategory::ALL {
            assert_eq!(category.label().parse::<WasteCategory>().unwrap(), category);
        }
    }

    #[test]
    fn category_rejects_unknown_values() {
        let err = "biomio".parse::<WasteCategory>().unwrap_err();
        assert_eq!(err.value, "biomio");
    }

    #[test]
    fn limits_accessors_map_each_category() {
        let mut limits = CapacityLimits::new(10, 20, 30);
        assert_eq!(limits.get(WasteCategory::Bio), 10);
        assert_eq!(limits.get(WasteCategory::Plastic), 20);
        assert_eq!(limits.get(WasteCategory::Glass), 30);
        *limits.get_mut(WasteCategory::Plastic) -= 5;
        assert_eq!(limits.get(WasteCategory::Plastic), 15);
    }

    #[test]
    fn warehouse_serializes_flat_limit_fields() {
        let warehouse = Warehouse {
            id: 1,
            name: "north".to_string(),
            limits: CapacityLimits::new(1, 2, 3),
        };
        let value = serde_json::to_value(&warehouse).unwrap();
        assert_eq!(value["bio_limit"], 1);
        assert_eq!(value["plastic_limit"], 2);
        assert_eq!(value["glass_limit"], 3);
    }

    #[test]
    fn patch_deserializes_sparsely() {
        let patch: ReservationPatch = serde_json::from_str(r#"{"accepted": false}"#).unwrap();
        assert_eq!(patch.accepted, Some(false));
        assert!(patch.date.is_none());

        let empty: ReservationPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }
}
