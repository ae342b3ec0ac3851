use kasland_shared::{GridPos, Parcel};

use crate::stats::format_stat;
use crate::time_format::{format_countdown, format_timestamp, in_grace_period};

pub const NOT_FOUND: &str = "Error: Parcel information not found.";

#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
    pub label: &'static str,
    pub value: String,
    /// Fee rows are flagged while the parcel sits in its grace period.
    pub warning: bool,
}

impl InfoRow {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
            warning: false,
        }
    }

    fn warned(mut self, warning: bool) -> Self {
        self.warning = warning;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaleInfo {
    pub price: String,
    pub seller: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParcelInfo {
    Owned {
        rows: Vec<InfoRow>,
        sale: Option<SaleInfo>,
    },
    Unassigned {
        id: String,
        pos: GridPos,
    },
    NotFound,
}

fn or_na(value: Option<&str>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or("N/A")
        .to_string()
}

fn amount(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{v:.2} KAS"))
}

fn per_day(value: Option<f64>) -> String {
    format!("{}/day", format_stat(value.unwrap_or(0.0)))
}

fn id_label(parcel: &Parcel) -> String {
    parcel.id.map_or_else(|| "N/A".to_string(), |id| id.to_string())
}

impl ParcelInfo {
    pub fn describe(parcel: Option<&Parcel>, now_secs: f64) -> Self {
        let Some(parcel) = parcel else {
            return ParcelInfo::NotFound;
        };
        let Some(owner) = parcel.owner() else {
            return ParcelInfo::Unassigned {
                id: id_label(parcel),
                pos: parcel.pos(),
            };
        };

        let grace = in_grace_period(parcel.next_fee_date, now_secs);
        let max_count = match parcel.max_count {
            Some(max) => format!("{} / {max}", parcel.current_count.unwrap_or(0)),
            None => "Unlimited".to_string(),
        };

        let rows = vec![
            InfoRow::new("ID", id_label(parcel)),
            InfoRow::new("Owner", owner),
            InfoRow::new("Type", or_na(parcel.building_type.as_deref())),
            InfoRow::new("Max Count", max_count),
            InfoRow::new("Variant", or_na(parcel.building_variant.as_deref())),
            InfoRow::new("Rarity", or_na(parcel.rarity.as_deref())),
            InfoRow::new("Purchase amount", amount(parcel.purchase_amount)),
            InfoRow::new("Coordinates", format!("({}, {})", parcel.x, parcel.y)),
            InfoRow::new("Purchased on", format_timestamp(parcel.purchase_date)),
            InfoRow::new("Fee amount", amount(parcel.last_fee_amount)),
            InfoRow::new("Next fee date", format_timestamp(parcel.next_fee_date)).warned(grace),
            InfoRow::new(
                "Time until next fee",
                format_countdown(parcel.next_fee_date, now_secs),
            )
            .warned(grace),
            InfoRow::new("Energy production", per_day(parcel.energy_production)),
            InfoRow::new("Energy consumption", per_day(parcel.energy_consumption)),
            InfoRow::new("zkaspa production", per_day(parcel.zkaspa_production)),
            InfoRow::new(
                "zkaspa balance",
                format_stat(parcel.zkaspa_balance.unwrap_or(0.0)),
            ),
            InfoRow::new("Last fee payment", format_timestamp(parcel.last_fee_payment)),
            InfoRow::new("Last fee check", format_timestamp(parcel.last_fee_check)),
            InfoRow::new(
                "Fee frequency",
                parcel
                    .fee_frequency
                    .map_or_else(|| "N/A".to_string(), |d| format!("{} days", format_stat(d))),
            ),
        ];

        let sale = parcel.is_for_sale.then(|| SaleInfo {
            price: amount(parcel.sale_price),
            seller: owner.to_string(),
        });

        ParcelInfo::Owned { rows, sale }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn in_grace_period(&self) -> bool {
        match self {
            ParcelInfo::Owned { rows, .. } => rows.iter().any(|row| row.warning),
            _ => false,
        }
    }
}
