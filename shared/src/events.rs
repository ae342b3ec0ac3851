use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payload of `GET /api/kasland_status`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KasLandStatus {
    #[serde(default)]
    pub is_full: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl KasLandStatus {
    /// Banner text while every plot is sold, `None` otherwise.
    pub fn banner(&self) -> Option<String> {
        if !self.is_full {
            return None;
        }
        Some(
            self.message
                .clone()
                .unwrap_or_else(|| "All plots have been sold.".to_string()),
        )
    }
}

/// One entry of `GET /api/current_events`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentEvent {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    /// Unix seconds.
    #[serde(default)]
    pub end_time: f64,
}

impl CurrentEvent {
    pub fn ends_at(&self) -> Option<DateTime<Utc>> {
        if !self.end_time.is_finite() || self.end_time <= 0.0 {
            return None;
        }
        DateTime::from_timestamp(self.end_time as i64, 0)
    }
}

/// Static `maintenance.json` served next to the client bundle.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatus {
    #[serde(default)]
    pub maintenance_mode: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl MaintenanceStatus {
    pub fn banner(&self) -> Option<String> {
        self.maintenance_mode
            .then(|| self.message.clone().unwrap_or_default())
    }
}
