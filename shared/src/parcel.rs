use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Integer grid coordinate of a parcel. Ordered by `x`, then `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i64,
    pub y: i64,
}

impl GridPos {
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Whether the coordinate lies inside a `map_size` x `map_size` grid.
    pub fn in_bounds(&self, map_size: u32) -> bool {
        let size = i64::from(map_size);
        self.x >= 0 && self.y >= 0 && self.x < size && self.y < size
    }
}

impl fmt::Display for GridPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// One map cell as served by `/api/all_parcels`.
///
/// Everything except the coordinates is optional on the wire: SQLite rows come
/// through with nulls for unowned parcels, and the client has to cope with
/// partially populated owned rows as well.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Parcel {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    pub x: i64,
    pub y: i64,
    #[serde(default)]
    pub owner_address: Option<String>,
    #[serde(default)]
    pub building_type: Option<String>,
    #[serde(default)]
    pub building_variant: Option<String>,
    #[serde(default)]
    pub rarity: Option<String>,
    /// Parcel category column, passed through untouched.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "flag")]
    pub is_for_sale: bool,
    #[serde(default)]
    pub sale_price: Option<f64>,
    #[serde(default)]
    pub purchase_amount: Option<f64>,
    #[serde(default)]
    pub purchase_date: Option<f64>,
    #[serde(default)]
    pub last_fee_amount: Option<f64>,
    #[serde(default)]
    pub next_fee_date: Option<f64>,
    #[serde(default)]
    pub fee_frequency: Option<f64>,
    #[serde(default)]
    pub last_fee_payment: Option<f64>,
    #[serde(default)]
    pub last_fee_check: Option<f64>,
    #[serde(default)]
    pub energy_production: Option<f64>,
    #[serde(default)]
    pub energy_consumption: Option<f64>,
    #[serde(default)]
    pub zkaspa_production: Option<f64>,
    #[serde(default)]
    pub zkaspa_balance: Option<f64>,
    #[serde(default)]
    pub current_count: Option<u32>,
    #[serde(default)]
    pub max_count: Option<u32>,
}

impl Parcel {
    pub fn pos(&self) -> GridPos {
        GridPos::new(self.x, self.y)
    }

    /// Owner address, treating an empty string the same as no owner.
    pub fn owner(&self) -> Option<&str> {
        self.owner_address.as_deref().filter(|addr| !addr.is_empty())
    }

    pub fn is_owned(&self) -> bool {
        self.owner().is_some()
    }

    /// Ids of zero are treated as missing: the backend never issues them and
    /// the legacy client discarded them as falsy.
    pub fn has_id(&self) -> bool {
        matches!(self.id, Some(id) if id != 0)
    }

    /// Building type and variant, only when both are present and non-empty.
    pub fn building(&self) -> Option<(&str, &str)> {
        let kind = self.building_type.as_deref().filter(|s| !s.is_empty())?;
        let variant = self.building_variant.as_deref().filter(|s| !s.is_empty())?;
        Some((kind, variant))
    }

    pub fn is_owned_by(&self, address: &str) -> bool {
        self.owner() == Some(address)
    }
}

/// Payload of `GET /api/all_parcels`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParcelsResponse {
    pub map_size: u32,
    #[serde(default)]
    pub parcels: Vec<Parcel>,
}

/// Ids that are not integers become `None`, so one bad row is dropped by the
/// validity filter instead of failing the whole payload.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Int(i64),
        Float(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Id>::deserialize(deserializer)? {
        Some(Id::Int(i)) => Some(i),
        Some(Id::Float(f)) if f.is_finite() && f.fract() == 0.0 => Some(f as i64),
        Some(Id::Text(text)) => text.trim().parse().ok(),
        Some(Id::Float(_) | Id::Other(_)) | None => None,
    })
}

/// SQLite stores booleans as 0/1, so accept bools, integers and null.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        Some(Flag::Float(f)) => f != 0.0,
        None => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_flag_accepts_sqlite_integers() {
        let json = r#"{"id": 3, "x": 1, "y": 2, "is_for_sale": 1, "sale_price": 12.5}"#;
        let parcel: Parcel = serde_json::from_str(json).expect("parcel");
        assert!(parcel.is_for_sale);
        assert_eq!(parcel.sale_price, Some(12.5));

        let json = r#"{"id": 3, "x": 1, "y": 2, "is_for_sale": null}"#;
        let parcel: Parcel = serde_json::from_str(json).expect("parcel");
        assert!(!parcel.is_for_sale);

        let json = r#"{"id": 3, "x": 1, "y": 2, "is_for_sale": true}"#;
        let parcel: Parcel = serde_json::from_str(json).expect("parcel");
        assert!(parcel.is_for_sale);
    }

    #[test]
    fn unowned_row_with_nulls_parses() {
        let json = r#"{
            "id": 7, "x": 0, "y": 4, "owner_address": null, "building_type": null,
            "building_variant": null, "purchase_amount": null, "rarity": "Unknown",
            "type": null, "current_count": 0, "max_count": null
        }"#;
        let parcel: Parcel = serde_json::from_str(json).expect("parcel");
        assert!(!parcel.is_owned());
        assert_eq!(parcel.pos(), GridPos::new(0, 4));
        assert_eq!(parcel.building(), None);
        assert_eq!(parcel.current_count, Some(0));
    }

    #[test]
    fn unparsable_id_drops_only_that_parcel() {
        let json = r#"{"map_size": 2, "parcels": [
            {"id": "abc", "x": 0, "y": 0},
            {"id": {"nested": 1}, "x": 0, "y": 1},
            {"id": "42", "x": 1, "y": 0},
            {"id": 5.0, "x": 1, "y": 1}
        ]}"#;
        let response: ParcelsResponse = serde_json::from_str(json).expect("parcels");
        let ids: Vec<_> = response.parcels.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![None, None, Some(42), Some(5)]);
        assert!(!response.parcels[0].has_id());
    }

    #[test]
    fn zero_or_absent_id_is_missing() {
        let mut parcel = Parcel {
            id: Some(0),
            ..Parcel::default()
        };
        assert!(!parcel.has_id());
        parcel.id = None;
        assert!(!parcel.has_id());
        parcel.id = Some(12);
        assert!(parcel.has_id());
    }

    #[test]
    fn empty_owner_counts_as_unowned() {
        let parcel = Parcel {
            id: Some(1),
            owner_address: Some(String::new()),
            ..Parcel::default()
        };
        assert!(!parcel.is_owned());
        assert!(!parcel.is_owned_by(""));
    }

    #[test]
    fn building_requires_type_and_variant() {
        let parcel = Parcel {
            id: Some(1),
            owner_address: Some("kaspa:abc".into()),
            building_type: Some("Factory".into()),
            ..Parcel::default()
        };
        assert_eq!(parcel.building(), None);

        let parcel = Parcel {
            building_variant: Some("Blue".into()),
            ..parcel
        };
        assert_eq!(parcel.building(), Some(("Factory", "Blue")));
    }

    #[test]
    fn bounds_check_is_half_open() {
        assert!(GridPos::new(0, 0).in_bounds(2));
        assert!(GridPos::new(1, 1).in_bounds(2));
        assert!(!GridPos::new(2, 0).in_bounds(2));
        assert!(!GridPos::new(0, -1).in_bounds(2));
        assert!(!GridPos::new(0, 0).in_bounds(0));
    }

    #[test]
    fn grid_pos_displays_as_cache_key() {
        assert_eq!(GridPos::new(3, 14).to_string(), "3,14");
    }
}
