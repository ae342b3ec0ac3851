//! In-memory copy of the game state, swapped wholesale on every refresh.

use std::collections::BTreeMap;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use kasland_shared::{EnergyStats, GameInfo, GridPos, Parcel, ParcelsResponse, TopWallet};

use crate::api::{self, FetchError};

/// One consistent view of every dataset fetched in a refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub map_size: u32,
    pub parcels: BTreeMap<GridPos, Parcel>,
    pub top_wallets: Vec<TopWallet>,
    pub game_info: GameInfo,
    pub energy_stats: EnergyStats,
}

impl Snapshot {
    /// Index parcels by coordinate. A later entry at the same coordinate
    /// replaces an earlier one.
    pub fn from_parts(
        parcels: ParcelsResponse,
        top_wallets: Vec<TopWallet>,
        game_info: GameInfo,
        energy_stats: EnergyStats,
    ) -> Self {
        let mut by_pos = BTreeMap::new();
        for parcel in parcels.parcels {
            if by_pos.insert(parcel.pos(), parcel).is_some() {
                log::debug!("duplicate parcel coordinate in snapshot, keeping last");
            }
        }
        Self {
            map_size: parcels.map_size,
            parcels: by_pos,
            top_wallets,
            game_info,
            energy_stats,
        }
    }
}

/// Issued when a refresh starts; only the newest ticket may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A newer refresh was started before this one resolved.
    Superseded,
    Failed,
}

#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    snapshot: Snapshot,
    issued_seq: u64,
    /// Bumped on every applied snapshot so views can cheaply detect change.
    generation: u64,
    last_error: Option<FetchError>,
}

impl LocalStore {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn has_data(&self) -> bool {
        self.generation > 0
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn map_size(&self) -> u32 {
        self.snapshot.map_size
    }

    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.issued_seq += 1;
        RefreshTicket(self.issued_seq)
    }

    pub fn complete_refresh(
        &mut self,
        ticket: RefreshTicket,
        result: Result<Snapshot, FetchError>,
    ) -> RefreshOutcome {
        if ticket.0 != self.issued_seq {
            return RefreshOutcome::Superseded;
        }
        match result {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.generation += 1;
                self.last_error = None;
                RefreshOutcome::Applied
            }
            Err(e) => {
                self.last_error = Some(e);
                RefreshOutcome::Failed
            }
        }
    }

    pub fn parcel(&self, pos: GridPos) -> Option<&Parcel> {
        self.snapshot.parcels.get(&pos)
    }

    /// First parcel, in coordinate order, owned by `address`.
    pub fn parcel_by_owner(&self, address: &str) -> Option<&Parcel> {
        if address.is_empty() {
            return None;
        }
        self.snapshot
            .parcels
            .values()
            .find(|parcel| parcel.is_owned_by(address))
    }
}

/// Fetch all datasets concurrently; any failure aborts the whole snapshot.
pub async fn fetch_snapshot() -> Result<Snapshot, FetchError> {
    let (parcels, top_wallets, game_info, energy_stats) = futures::try_join!(
        api::fetch_parcels(),
        api::fetch_top_wallets(),
        api::fetch_game_info(),
        api::fetch_energy_stats(),
    )?;
    Ok(Snapshot::from_parts(
        parcels,
        top_wallets,
        game_info,
        energy_stats,
    ))
}

/// Start a refresh; the result is applied only if no newer one has started.
pub fn refresh(store: RwSignal<LocalStore>) {
    let Some(ticket) = store.try_update(|s| s.begin_refresh()) else {
        return;
    };
    spawn_local(async move {
        let result = fetch_snapshot().await;
        let Some(outcome) = store.try_update(|s| s.complete_refresh(ticket, result)) else {
            return;
        };
        match outcome {
            RefreshOutcome::Applied => {
                store.with_untracked(|s| {
                    log::info!(
                        "game state refreshed: {} parcels, map size {}",
                        s.snapshot().parcels.len(),
                        s.map_size()
                    );
                });
            }
            RefreshOutcome::Superseded => {
                log::debug!("discarding superseded refresh {}", ticket.0);
            }
            RefreshOutcome::Failed => {
                store.with_untracked(|s| {
                    if let Some(e) = s.last_error() {
                        log::error!("game state refresh failed: {e}");
                    }
                });
            }
        }
    });
}
