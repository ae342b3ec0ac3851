//! Display-ready figures for the stats panel and leaderboard.

use kasland_shared::{EnergyStats, GameInfo, TopWallet};

pub const LEADERBOARD_TITLE: &str = "Top 10 richest Kaspians (in zkaspa)";
pub const THANK_YOU: &str = "A heartfelt thank you to all our players! Your support and engagement \
are the driving force behind the game's growth and evolution. Together, we're shaping the future \
of KasLand!";
const NO_EVENT: &str = "No active event";

/// Whole numbers print bare, anything else with two decimals.
pub fn format_stat(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// `0x1234...abcd` style shortening; short inputs come back unchanged.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

/// Day-over-day change, absent when there is nothing to compare against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Change(pub f64);

impl Change {
    pub fn between(current: f64, previous: Option<f64>) -> Option<Self> {
        let previous = previous.filter(|p| *p != 0.0 && p.is_finite())?;
        Some(Change((current - previous) / previous * 100.0))
    }

    pub fn is_positive(&self) -> bool {
        self.0 >= 0.0
    }

    pub fn label(&self) -> String {
        let sign = if self.is_positive() { "+" } else { "" };
        format!(" ({sign}{:.1}%)", self.0)
    }

    pub fn class(&self) -> &'static str {
        if self.is_positive() {
            "change-up"
        } else {
            "change-down"
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub total_parcels: String,
    pub community_fund: String,
    pub redistribution_amount: String,
    pub unique_owners: String,
    pub energy_production: String,
    pub energy_consumption: String,
    pub total_zkaspa: String,
    pub predicted_zkaspa: String,
    pub deficit: bool,
    pub energy_status: &'static str,
    pub event: String,
    pub production_change: Option<Change>,
    pub consumption_change: Option<Change>,
    pub zkaspa_change: Option<Change>,
}

impl StatsView {
    pub fn new(game: &GameInfo, energy: &EnergyStats) -> Self {
        let deficit = energy.is_deficit();
        let predicted = energy.effective_zkaspa_production();
        let yesterday = game.yesterday_stats.clone().unwrap_or_default();

        Self {
            total_parcels: game.total_parcels.to_string(),
            community_fund: format_stat(game.community_fund),
            redistribution_amount: format_stat(game.redistribution_amount),
            unique_owners: game.unique_owners.to_string(),
            energy_production: format_stat(energy.total_energy_production),
            energy_consumption: format_stat(energy.total_energy_consumption),
            total_zkaspa: format_stat(energy.total_zkaspa),
            predicted_zkaspa: format_stat(predicted),
            deficit,
            energy_status: if deficit {
                "Energy Deficit"
            } else {
                "Energy Surplus"
            },
            event: energy
                .active_event()
                .map(str::to_string)
                .unwrap_or_else(|| NO_EVENT.to_string()),
            production_change: Change::between(
                energy.total_energy_production,
                yesterday.total_energy_production,
            ),
            consumption_change: Change::between(
                energy.total_energy_consumption,
                yesterday.total_energy_consumption,
            ),
            zkaspa_change: Change::between(predicted, yesterday.predicted_zkaspa_production),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardRow {
    pub rank: usize,
    pub address: String,
    pub amount: String,
}

impl LeaderboardRow {
    pub fn text(&self) -> String {
        format!(
            "{}. Address: {} - Amount: {} zkaspa",
            self.rank, self.address, self.amount
        )
    }
}

pub fn leaderboard(wallets: &[TopWallet]) -> Vec<LeaderboardRow> {
    wallets
        .iter()
        .enumerate()
        .map(|(i, wallet)| LeaderboardRow {
            rank: i + 1,
            address: short_address(&wallet.address),
            amount: format!("{:.2}", wallet.amount),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasland_shared::YesterdayStats;

    fn energy(production: f64, consumption: f64, predicted: f64) -> EnergyStats {
        EnergyStats {
            total_energy_production: production,
            total_energy_consumption: consumption,
            total_zkaspa: 1234.5,
            predicted_zkaspa_production: predicted,
            ..EnergyStats::default()
        }
    }

    #[test]
    fn whole_numbers_drop_decimals() {
        assert_eq!(format_stat(42.0), "42");
        assert_eq!(format_stat(7.25691), "7.26");
        assert_eq!(format_stat(0.0), "0");
    }

    #[test]
    fn addresses_keep_six_and_four() {
        assert_eq!(
            short_address("kaspa:qpz0123456789abcdef"),
            "kaspa:...cdef"
        );
        assert_eq!(short_address("kaspa:abc"), "kaspa:abc");
    }

    #[test]
    fn change_needs_a_nonzero_baseline() {
        assert_eq!(Change::between(10.0, None), None);
        assert_eq!(Change::between(10.0, Some(0.0)), None);
        let up = Change::between(110.0, Some(100.0)).unwrap();
        assert_eq!(up.label(), " (+10.0%)");
        assert!(up.is_positive());
        let down = Change::between(75.0, Some(100.0)).unwrap();
        assert_eq!(down.label(), " (-25.0%)");
        assert_eq!(down.class(), "change-down");
    }

    #[test]
    fn deficit_zeroes_predicted_production_and_flags_status() {
        let game = GameInfo {
            yesterday_stats: Some(YesterdayStats {
                predicted_zkaspa_production: Some(50.0),
                ..YesterdayStats::default()
            }),
            ..GameInfo::default()
        };
        let view = StatsView::new(&game, &energy(100.0, 150.0, 80.0));
        assert!(view.deficit);
        assert_eq!(view.predicted_zkaspa, "0");
        assert_eq!(view.energy_status, "Energy Deficit");
        assert_eq!(view.zkaspa_change.map(|c| c.label()), Some(" (-100.0%)".into()));
        assert_eq!(view.production_change, None);
    }

    #[test]
    fn surplus_view_formats_every_figure() {
        let game = GameInfo {
            total_parcels: 400,
            community_fund: 12.5,
            redistribution_amount: 7.0,
            unique_owners: 31,
            ..GameInfo::default()
        };
        let view = StatsView::new(&game, &energy(200.0, 150.0, 80.25));
        assert!(!view.deficit);
        assert_eq!(view.total_parcels, "400");
        assert_eq!(view.community_fund, "12.50");
        assert_eq!(view.redistribution_amount, "7");
        assert_eq!(view.predicted_zkaspa, "80.25");
        assert_eq!(view.total_zkaspa, "1234.50");
        assert_eq!(view.energy_status, "Energy Surplus");
        assert_eq!(view.event, "No active event");
    }

    #[test]
    fn leaderboard_ranks_from_one() {
        let rows = leaderboard(&[
            TopWallet {
                address: "kaspa:qqqqqqqqqqqq1111".into(),
                amount: 99.999,
            },
            TopWallet {
                address: "kaspa:rrrrrrrrrrrr2222".into(),
                amount: 5.0,
            },
        ]);
        assert_eq!(rows[0].text(), "1. Address: kaspa:...1111 - Amount: 100.00 zkaspa");
        assert_eq!(rows[1].rank, 2);
        assert_eq!(rows[1].amount, "5.00");
    }
}
