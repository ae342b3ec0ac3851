use serde::de::DeserializeOwned;

use kasland_shared::{
    CurrentEvent, EnergyStats, GameInfo, KasLandStatus, MaintenanceStatus, ParcelsResponse,
    TopWallet,
};

use crate::config;

#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("fetch error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("parse error for {url}: {message}")]
    Parse { url: String, message: String },
}

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| FetchError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

    if !resp.ok() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: resp.status(),
        });
    }

    resp.json::<T>().await.map_err(|e| FetchError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })
}

/// Every parcel plus the current map size.
pub async fn fetch_parcels() -> Result<ParcelsResponse, FetchError> {
    get_json(&config::api_url("all_parcels")).await
}

pub async fn fetch_top_wallets() -> Result<Vec<TopWallet>, FetchError> {
    get_json(&config::api_url("top_wallets")).await
}

pub async fn fetch_game_info() -> Result<GameInfo, FetchError> {
    get_json(&config::api_url("game_info")).await
}

pub async fn fetch_energy_stats() -> Result<EnergyStats, FetchError> {
    get_json(&config::api_url("energy_stats")).await
}

pub async fn fetch_kasland_status() -> Result<KasLandStatus, FetchError> {
    get_json(&config::api_url("kasland_status")).await
}

/// Events whose window contains the server's current time.
pub async fn fetch_current_events() -> Result<Vec<CurrentEvent>, FetchError> {
    get_json(&config::api_url("current_events")).await
}

pub async fn fetch_maintenance() -> Result<MaintenanceStatus, FetchError> {
    get_json(config::MAINTENANCE_URL).await
}

#[cfg(test)]
mod tests {
    use super::FetchError;

    #[test]
    fn errors_name_the_failing_url() {
        let err = FetchError::Status {
            url: "/api/all_parcels".into(),
            status: 503,
        };
        assert_eq!(err.to_string(), "HTTP 503 from /api/all_parcels");

        let err = FetchError::Parse {
            url: "/api/game_info".into(),
            message: "missing field `total_parcels`".into(),
        };
        assert!(err.to_string().starts_with("parse error for /api/game_info"));
    }
}
