use serde::{Deserialize, Serialize};

/// One leaderboard row from `GET /api/top_wallets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopWallet {
    pub address: String,
    #[serde(default)]
    pub amount: f64,
}

/// Figures recorded for the previous day, used for day-over-day deltas.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct YesterdayStats {
    #[serde(default)]
    pub total_energy_production: Option<f64>,
    #[serde(default)]
    pub total_energy_consumption: Option<f64>,
    #[serde(default)]
    pub total_zkaspa: Option<f64>,
    #[serde(default)]
    pub predicted_zkaspa_production: Option<f64>,
}

/// Payload of `GET /api/game_info`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameInfo {
    #[serde(default)]
    pub total_parcels: u64,
    #[serde(default)]
    pub community_fund: f64,
    #[serde(default)]
    pub redistribution_amount: f64,
    #[serde(default)]
    pub unique_owners: u64,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub yesterday_stats: Option<YesterdayStats>,
}

/// Payload of `GET /api/energy_stats`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnergyStats {
    #[serde(default)]
    pub total_energy_production: f64,
    #[serde(default)]
    pub total_energy_consumption: f64,
    #[serde(default)]
    pub total_zkaspa: f64,
    #[serde(default)]
    pub predicted_zkaspa_production: f64,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub energy_multiplier: Option<f64>,
    #[serde(default)]
    pub zkaspa_multiplier: Option<f64>,
}

impl EnergyStats {
    /// Consumption strictly above production.
    pub fn is_deficit(&self) -> bool {
        self.total_energy_consumption > self.total_energy_production
    }

    /// Predicted zkaspa production as players see it: nothing is produced
    /// while the grid runs an energy deficit.
    pub fn effective_zkaspa_production(&self) -> f64 {
        if self.is_deficit() {
            0.0
        } else {
            self.predicted_zkaspa_production.max(0.0)
        }
    }

    /// Active event label, ignoring blank strings.
    pub fn active_event(&self) -> Option<&str> {
        self.event_type.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn energy(production: f64, consumption: f64, predicted: f64) -> EnergyStats {
        EnergyStats {
            total_energy_production: production,
            total_energy_consumption: consumption,
            predicted_zkaspa_production: predicted,
            ..EnergyStats::default()
        }
    }

    #[test]
    fn deficit_zeroes_predicted_production() {
        let stats = energy(100.0, 120.0, 42.0);
        assert!(stats.is_deficit());
        assert_eq!(stats.effective_zkaspa_production(), 0.0);
    }

    #[test]
    fn balanced_grid_is_not_a_deficit() {
        let stats = energy(100.0, 100.0, 42.0);
        assert!(!stats.is_deficit());
        assert_eq!(stats.effective_zkaspa_production(), 42.0);
    }

    #[test]
    fn game_info_tolerates_missing_yesterday_values() {
        let json = r#"{
            "total_parcels": 48, "community_fund": 12.5, "redistribution_amount": 3,
            "unique_owners": 30, "event_type": null,
            "yesterday_stats": {"total_energy_production": null, "total_energy_consumption": 80.0,
                                "total_zkaspa": null, "predicted_zkaspa_production": null}
        }"#;
        let info: GameInfo = serde_json::from_str(json).expect("game info");
        let yesterday = info.yesterday_stats.expect("yesterday");
        assert_eq!(yesterday.total_energy_production, None);
        assert_eq!(yesterday.total_energy_consumption, Some(80.0));
        assert_eq!(info.unique_owners, 30);
    }

    #[test]
    fn blank_event_type_is_no_event() {
        let mut stats = energy(1.0, 0.0, 0.0);
        stats.event_type = Some("  ".into());
        assert_eq!(stats.active_event(), None);
        stats.event_type = Some("Solar Storm".into());
        assert_eq!(stats.active_event(), Some("Solar Storm"));
    }
}
