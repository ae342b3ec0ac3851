use gloo_storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};

pub(crate) const API_BASE: &str = "/api";
/// Served as a static file so it can be flipped without a backend deploy.
pub(crate) const MAINTENANCE_URL: &str = "/static/maintenance.json";
pub(crate) const IMAGE_BASE: &str = "/static/images";

pub(crate) const GAME_REFRESH_MS: u32 = 180_000;
pub(crate) const MAINTENANCE_POLL_MS: u32 = 180_000;
pub(crate) const KASLAND_STATUS_POLL_MS: u32 = 60_000;
pub(crate) const EVENTS_POLL_MS: u32 = 300_000;
pub(crate) const WALLET_POLL_MS: u32 = 30_000;

/// Viewports at most this wide get the mobile layout and sparse border.
pub(crate) const MOBILE_BREAKPOINT_PX: f64 = 768.0;

/// Parcels whose fee is overdue keep their owner for this long.
pub(crate) const GRACE_PERIOD_DAYS: i64 = 7;

const SETTINGS_KEY: &str = "kasland_settings";

/// User preferences persisted in localStorage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    pub show_stats_panel: bool,
    pub show_border: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_stats_panel: true,
            show_border: true,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        LocalStorage::get(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn save(&self) {
        if let Err(e) = LocalStorage::set(SETTINGS_KEY, self) {
            log::warn!("failed to persist settings: {e}");
        }
    }
}

pub(crate) fn api_url(path: &str) -> String {
    format!("{API_BASE}/{}", path.trim_start_matches('/'))
}

/// Inner window width, falling back to a desktop width outside a browser.
pub(crate) fn window_width() -> f64 {
    web_sys::window()
        .and_then(|w| w.inner_width().ok())
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0)
}

pub(crate) fn is_mobile_width(width: f64) -> bool {
    width <= MOBILE_BREAKPOINT_PX
}
