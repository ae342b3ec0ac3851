use std::collections::HashSet;

use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use kasland_shared::CurrentEvent;

use crate::api;

/// Remembers which events already had their announcement popup.
#[derive(Debug, Default)]
pub struct EventTracker {
    announced: HashSet<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventUpdate {
    /// Event whose type is shown in the header indicator.
    pub current: Option<CurrentEvent>,
    /// Set only the first time a given event id is seen.
    pub announce: Option<CurrentEvent>,
}

impl EventTracker {
    pub fn observe(&mut self, events: &[CurrentEvent]) -> EventUpdate {
        let current = events.first().cloned();
        let announce = current
            .as_ref()
            .filter(|event| self.announced.insert(event.id))
            .cloned();
        EventUpdate { current, announce }
    }
}

pub fn check_kasland_status(banner: RwSignal<Option<String>>) {
    spawn_local(async move {
        match api::fetch_kasland_status().await {
            Ok(status) => banner.set(status.banner()),
            Err(e) => log::warn!("KasLand status check failed: {e}"),
        }
    });
}

pub fn check_maintenance(banner: RwSignal<Option<String>>) {
    spawn_local(async move {
        match api::fetch_maintenance().await {
            Ok(status) => banner.set(status.banner()),
            Err(e) => log::warn!("maintenance check failed: {e}"),
        }
    });
}

pub fn check_events(
    tracker: StoredValue<EventTracker>,
    current: RwSignal<Option<CurrentEvent>>,
    popup: RwSignal<Option<CurrentEvent>>,
) {
    spawn_local(async move {
        let events = match api::fetch_current_events().await {
            Ok(events) => events,
            Err(e) => {
                log::warn!("event check failed: {e}");
                return;
            }
        };
        let Some(update) = tracker.try_update_value(|t| t.observe(&events)) else {
            return;
        };
        current.set(update.current);
        if let Some(event) = update.announce {
            log::info!("new event {} ({})", event.id, event.kind);
            popup.set(Some(event));
        }
    });
}
