use std::cell::RefCell;

use gloo_timers::callback::Interval;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen_futures::spawn_local;

use kasland_shared::{CurrentEvent, GridPos};

use crate::config::{self, Settings};
use crate::map_view::MapView;
use crate::panels::{
    EventPopup, LeaderboardDialog, NoticeToast, ParcelInfoPanel, StatsPanel, StatusBanners, TopBar,
};
use crate::status::{self, EventTracker};
use crate::store::{self, LocalStore};
use crate::viewport::Viewport;
use crate::wallet::{self, WalletError};

/// Newtype wrappers so same-typed signals get distinct Leptos contexts.
#[derive(Clone, Copy)]
pub(crate) struct WalletAccount(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedParcel(pub RwSignal<Option<GridPos>>);
/// Bumped to ask the map to re-measure its container.
#[derive(Clone, Copy)]
pub(crate) struct FitRequest(pub RwSignal<u64>);
#[derive(Clone, Copy)]
pub(crate) struct Notice(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct KasLandBanner(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct MaintenanceBanner(pub RwSignal<Option<String>>);
#[derive(Clone, Copy)]
pub(crate) struct ActiveEvent(pub RwSignal<Option<CurrentEvent>>);
#[derive(Clone, Copy)]
pub(crate) struct AnnouncedEvent(pub RwSignal<Option<CurrentEvent>>);
#[derive(Clone, Copy)]
pub(crate) struct LeaderboardOpen(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct IsFullscreen(pub RwSignal<bool>);

struct ListenerBinding {
    target: web_sys::EventTarget,
    event: &'static str,
    handler: Closure<dyn Fn(web_sys::Event)>,
}

thread_local! {
    static POLL_BINDINGS: RefCell<Vec<Interval>> = const { RefCell::new(Vec::new()) };
    static LISTENER_BINDINGS: RefCell<Vec<ListenerBinding>> = const { RefCell::new(Vec::new()) };
}

fn bind_listener(
    target: web_sys::EventTarget,
    event: &'static str,
    handler: impl Fn(web_sys::Event) + 'static,
) {
    let handler = Closure::<dyn Fn(web_sys::Event)>::new(handler);
    if target
        .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
        .is_ok()
    {
        LISTENER_BINDINGS.with(|slot| {
            slot.borrow_mut().push(ListenerBinding {
                target,
                event,
                handler,
            });
        });
    }
}

fn unbind_listeners() {
    LISTENER_BINDINGS.with(|slot| {
        for old in slot.borrow_mut().drain(..) {
            let _ = old
                .target
                .remove_event_listener_with_callback(old.event, old.handler.as_ref().unchecked_ref());
        }
    });
}

fn start_polls(polls: Vec<Interval>) {
    POLL_BINDINGS.with(|slot| {
        // Dropping an Interval cancels it.
        *slot.borrow_mut() = polls;
    });
}

fn poll_wallet(account: RwSignal<Option<String>>) {
    if !wallet::is_installed() {
        return;
    }
    spawn_local(async move {
        match wallet::current_account().await {
            Ok(next) => {
                if account.with_untracked(|current| *current != next) {
                    log::info!("KasWare account changed");
                    account.set(next);
                }
            }
            Err(e) => log::warn!("KasWare account check failed: {}", e.detail()),
        }
    });
}

/// Root application component. Provides global reactive signals via context.
#[component]
pub fn App() -> impl IntoView {
    let store: RwSignal<LocalStore> = RwSignal::new(LocalStore::default());
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    let settings: RwSignal<Settings> = RwSignal::new(Settings::load());
    let account: RwSignal<Option<String>> = RwSignal::new(None);
    let selected: RwSignal<Option<GridPos>> = RwSignal::new(None);
    let fit_request: RwSignal<u64> = RwSignal::new(0);
    let notice: RwSignal<Option<String>> = RwSignal::new(None);
    let kasland_banner: RwSignal<Option<String>> = RwSignal::new(None);
    let maintenance_banner: RwSignal<Option<String>> = RwSignal::new(None);
    let active_event: RwSignal<Option<CurrentEvent>> = RwSignal::new(None);
    let announced_event: RwSignal<Option<CurrentEvent>> = RwSignal::new(None);
    let leaderboard_open: RwSignal<bool> = RwSignal::new(false);
    let is_fullscreen: RwSignal<bool> = RwSignal::new(false);
    let event_tracker: StoredValue<EventTracker> = StoredValue::new(EventTracker::default());

    provide_context(store);
    provide_context(viewport);
    provide_context(settings);
    provide_context(WalletAccount(account));
    provide_context(SelectedParcel(selected));
    provide_context(FitRequest(fit_request));
    provide_context(Notice(notice));
    provide_context(KasLandBanner(kasland_banner));
    provide_context(MaintenanceBanner(maintenance_banner));
    provide_context(ActiveEvent(active_event));
    provide_context(AnnouncedEvent(announced_event));
    provide_context(LeaderboardOpen(leaderboard_open));
    provide_context(IsFullscreen(is_fullscreen));

    // Persist settings to localStorage on any change
    Effect::new(move || {
        settings.get().save();
    });

    // Initial loads, then periodic polls
    Effect::new(move || {
        store::refresh(store);
        status::check_maintenance(maintenance_banner);
        status::check_kasland_status(kasland_banner);
        status::check_events(event_tracker, active_event, announced_event);

        start_polls(vec![
            Interval::new(config::GAME_REFRESH_MS, move || store::refresh(store)),
            Interval::new(config::MAINTENANCE_POLL_MS, move || {
                status::check_maintenance(maintenance_banner)
            }),
            Interval::new(config::KASLAND_STATUS_POLL_MS, move || {
                status::check_kasland_status(kasland_banner)
            }),
            Interval::new(config::EVENTS_POLL_MS, move || {
                status::check_events(event_tracker, active_event, announced_event)
            }),
            Interval::new(config::WALLET_POLL_MS, move || poll_wallet(account)),
        ]);
    });

    // Pick up an already-authorised wallet and follow account switches.
    Effect::new(move || {
        wallet::on_accounts_changed(move |next| account.set(next));
        spawn_local(async move {
            match wallet::current_account().await {
                Ok(Some(current)) => {
                    log::info!("KasWare already connected");
                    account.set(Some(current));
                }
                Ok(None) => {}
                Err(WalletError::NotInstalled) => log::info!("KasWare not installed"),
                Err(e) => log::error!("error while checking KasWare account: {}", e.detail()),
            }
        });
    });

    // Window and document listeners
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        unbind_listeners();

        bind_listener(window.clone().into(), "resize", move |_| {
            fit_request.update(|n| *n += 1);
        });

        if let Some(document) = window.document() {
            let doc = document.clone();
            bind_listener(document.into(), "fullscreenchange", move |_| {
                is_fullscreen.set(doc.fullscreen_element().is_some());
                fit_request.update(|n| *n += 1);
            });
        }

        bind_listener(window.into(), "keydown", move |e| {
            let Some(e) = e.dyn_ref::<web_sys::KeyboardEvent>() else {
                return;
            };
            if e.key() == "Escape" {
                selected.set(None);
                leaderboard_open.set(false);
                announced_event.set(None);
                notice.set(None);
            }
        });
    });

    view! {
        <div style="position: fixed; inset: 0; overflow: hidden; background: #0c0e17;">
            <MapView />
            <TopBar />
            <StatusBanners />
            <StatsPanel />
            <ParcelInfoPanel />
            <LeaderboardDialog />
            <EventPopup />
            <NoticeToast />
        </div>
    }
}
