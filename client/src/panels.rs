//! Overlay panels around the map: stats, leaderboard, wallet, parcel info,
//! banners and event announcements.

use js_sys::{Function, Promise, Reflect};
use leptos::prelude::*;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};

use crate::app::{
    ActiveEvent, AnnouncedEvent, IsFullscreen, KasLandBanner, LeaderboardOpen, MaintenanceBanner,
    Notice, SelectedParcel, WalletAccount,
};
use crate::config::Settings;
use crate::parcel_info::{InfoRow, NOT_FOUND, ParcelInfo, SaleInfo};
use crate::stats::{self, Change, LEADERBOARD_TITLE, StatsView, THANK_YOU};
use crate::store::LocalStore;
use crate::time_format::{format_timestamp, now_secs};
use crate::wallet;

const PANEL_STYLE: &str = "background: rgba(19,22,31,0.94); border: 1px solid #282c3e; border-radius: 8px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;";
const BUTTON_STYLE: &str = "background: #1a1d2a; border: 1px solid #282c3e; border-radius: 6px; color: #e2e0d8; cursor: pointer; padding: 5px 10px; font-family: 'JetBrains Mono', monospace; font-size: 0.72rem;";
const CLOSE_STYLE: &str = "background: none; border: none; color: #5a5860; cursor: pointer; font-size: 1rem; line-height: 1; padding: 2px 4px;";
const COPIED: &str = "Address copied to clipboard!";

fn write_clipboard(text: &str) -> Option<Promise> {
    let navigator = web_sys::window()?.navigator();
    let clipboard = Reflect::get(navigator.as_ref(), &JsValue::from_str("clipboard")).ok()?;
    let write = Reflect::get(&clipboard, &JsValue::from_str("writeText"))
        .ok()?
        .dyn_into::<Function>()
        .ok()?;
    write
        .call1(&clipboard, &JsValue::from_str(text))
        .ok()?
        .dyn_into::<Promise>()
        .ok()
}

fn copy_address(address: String, notice: RwSignal<Option<String>>) {
    let Some(promise) = write_clipboard(&address) else {
        log::warn!("clipboard API unavailable");
        return;
    };
    spawn_local(async move {
        match JsFuture::from(promise).await {
            Ok(_) => notice.set(Some(COPIED.to_string())),
            Err(e) => log::error!("could not copy address: {e:?}"),
        }
    });
}

fn toggle_fullscreen() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    if document.fullscreen_element().is_some() {
        document.exit_fullscreen();
    } else if let Some(root) = document.document_element()
        && let Err(e) = root.request_fullscreen()
    {
        log::warn!("fullscreen request refused: {e:?}");
    }
}

fn change_badge(change: Option<Change>) -> impl IntoView {
    change.map(|change| {
        let color = if change.is_positive() {
            "#50c878"
        } else {
            "#e05555"
        };
        view! {
            <span class=change.class() style=format!("color: {color}; font-size: 0.7rem;")>
                {change.label()}
            </span>
        }
    })
}

fn stat_row(label: &'static str, value: String, change: Option<Change>) -> impl IntoView {
    view! {
        <div style="display: flex; justify-content: space-between; gap: 12px; padding: 2px 0; font-size: 0.78rem;">
            <span style="color: #9a9590;">{label}</span>
            <span style="font-family: 'JetBrains Mono', monospace; font-variant-numeric: tabular-nums;">
                {value}
                {change_badge(change)}
            </span>
        </div>
    }
}

fn show_border(settings: &mut Settings) -> &mut bool {
    &mut settings.show_border
}

#[component]
fn SettingsToggleRow(label: &'static str, field: fn(&mut Settings) -> &mut bool) -> impl IntoView {
    let settings: RwSignal<Settings> = expect_context();
    let active = move || {
        let mut current = settings.get();
        *field(&mut current)
    };

    view! {
        <div
            style="display: flex; align-items: center; justify-content: space-between; padding: 4px 0; cursor: pointer; font-size: 0.75rem;"
            on:click=move |_| settings.update(|s| {
                let flag = field(s);
                *flag = !*flag;
            })
        >
            <span style="color: #9a9590;">{label}</span>
            <span style=move || {
                if active() {
                    "display: inline-block; width: 8px; height: 8px; border-radius: 50%; background: #50c878; box-shadow: 0 0 5px rgba(80,200,120,0.4);"
                } else {
                    "display: inline-block; width: 8px; height: 8px; border-radius: 50%; background: #3a3f5c;"
                }
            } />
        </div>
    }
}

/// Game-wide economy figures; closable, with the choice persisted.
#[component]
pub fn StatsPanel() -> impl IntoView {
    let store: RwSignal<LocalStore> = expect_context();
    let settings: RwSignal<Settings> = expect_context();

    let stats = Memo::new(move |_| {
        store.with(|s| {
            let snapshot = s.snapshot();
            StatsView::new(&snapshot.game_info, &snapshot.energy_stats)
        })
    });

    view! {
        <Show when=move || settings.with(|s| s.show_stats_panel)>
            <div
                id="stats-panel"
                style=format!("position: absolute; top: 56px; left: 12px; z-index: 10; width: 270px; padding: 10px 12px; {PANEL_STYLE}")
            >
                <div style="display: flex; justify-content: space-between; align-items: center; margin-bottom: 6px;">
                    <span style="font-family: 'Silkscreen', monospace; font-size: 0.85rem; color: #f5c542;">"KasLand"</span>
                    <button
                        title="Hide stats"
                        style=CLOSE_STYLE
                        on:click=move |_| settings.update(|s| s.show_stats_panel = false)
                    >
                        "\u{00D7}"
                    </button>
                </div>
                {move || {
                    let figures = stats.get();
                    let status_color = if figures.deficit { "#e05555" } else { "#50c878" };
                    view! {
                        {stat_row("Total parcels", figures.total_parcels, None)}
                        {stat_row("Unique owners", figures.unique_owners, None)}
                        {stat_row("Community fund", format!("{} KAS", figures.community_fund), None)}
                        {stat_row("Redistribution", format!("{} KAS", figures.redistribution_amount), None)}
                        {stat_row("Energy production", figures.energy_production, figures.production_change)}
                        {stat_row("Energy consumption", figures.energy_consumption, figures.consumption_change)}
                        {stat_row("Total zkaspa", figures.total_zkaspa, None)}
                        {stat_row("Predicted zkaspa/day", figures.predicted_zkaspa, figures.zkaspa_change)}
                        <div style=format!("margin-top: 6px; font-size: 0.78rem; font-weight: 700; color: {status_color};")>
                            {figures.energy_status}
                        </div>
                        <div style="font-size: 0.72rem; color: #9a9590;">{figures.event}</div>
                    }
                }}
                <div style="margin-top: 8px; padding-top: 6px; border-top: 1px solid rgba(40,44,62,0.6);">
                    <SettingsToggleRow label="Border trees" field=show_border />
                </div>
            </div>
        </Show>
    }
}

#[component]
pub fn LeaderboardDialog() -> impl IntoView {
    let store: RwSignal<LocalStore> = expect_context();
    let LeaderboardOpen(open) = expect_context();

    let rows = Memo::new(move |_| store.with(|s| stats::leaderboard(&s.snapshot().top_wallets)));

    view! {
        <Show when=move || open.get()>
            <div
                id="top-wallets-container"
                style=format!("position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); z-index: 30; max-width: 480px; width: 90%; padding: 16px 20px; {PANEL_STYLE}")
            >
                <h2 style="margin: 0 0 10px; font-size: 1rem; color: #f5c542;">{LEADERBOARD_TITLE}</h2>
                <ul style="list-style: none; margin: 0; padding: 0; font-family: 'JetBrains Mono', monospace; font-size: 0.75rem;">
                    {move || rows.get().into_iter().map(|row| view! {
                        <li style="padding: 3px 0;">{row.text()}</li>
                    }).collect_view()}
                </ul>
                <p style="font-size: 0.75rem; color: #9a9590;">{THANK_YOU}</p>
                <button style=BUTTON_STYLE on:click=move |_| open.set(false)>"Close"</button>
            </div>
        </Show>
    }
}

#[component]
fn WalletBar() -> impl IntoView {
    let store: RwSignal<LocalStore> = expect_context();
    let WalletAccount(account) = expect_context();
    let Notice(notice) = expect_context();

    let summary = Memo::new(move |_| {
        let account = account.get()?;
        Some(store.with(|s| wallet::account_summary(s, &account)))
    });

    let on_connect = move |_| {
        if account.get_untracked().is_some() {
            return;
        }
        spawn_local(async move {
            match wallet::request_account().await {
                Ok(Some(connected)) => {
                    log::info!("KasWare connected");
                    account.set(Some(connected));
                }
                Ok(None) => log::info!("KasWare returned no accounts"),
                Err(e) => {
                    log::error!("KasWare connection failed: {}", e.detail());
                    notice.set(Some(e.to_string()));
                }
            }
        });
    };

    view! {
        <div id="kasware-bar" style="display: flex; align-items: center; gap: 8px;">
            <button style=BUTTON_STYLE on:click=on_connect>
                {move || account.with(|a| wallet::button_label(a.as_deref()))}
            </button>
            {move || summary.get().map(|text| view! {
                <span style="font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #9a9590;">{text}</span>
            })}
        </div>
    }
}

/// Header indicator for the running event.
#[component]
fn EventIndicator() -> impl IntoView {
    let ActiveEvent(current) = expect_context();
    let AnnouncedEvent(popup) = expect_context();

    move || {
        current.get().map(|event| {
            let kind = event.kind.clone();
            view! {
                <button
                    style=format!("{BUTTON_STYLE} color: #f5c542;")
                    title="Show event details"
                    on:click=move |_| popup.set(Some(event.clone()))
                >
                    {format!("Event: {kind}")}
                </button>
            }
        })
    }
}

#[component]
pub fn TopBar() -> impl IntoView {
    let settings: RwSignal<Settings> = expect_context();
    let LeaderboardOpen(leaderboard_open) = expect_context();
    let IsFullscreen(is_fullscreen) = expect_context();

    view! {
        <div
            style="position: absolute; top: 0; left: 0; right: 0; z-index: 20; display: flex; flex-wrap: wrap; align-items: center; gap: 8px; padding: 10px 12px; pointer-events: none;"
        >
            <div style="display: flex; gap: 8px; pointer-events: auto;">
                <WalletBar />
            </div>
            <div style="flex: 1;" />
            <div style="display: flex; gap: 8px; pointer-events: auto;">
                <EventIndicator />
                <Show when=move || !settings.with(|s| s.show_stats_panel)>
                    <button style=BUTTON_STYLE on:click=move |_| settings.update(|s| s.show_stats_panel = true)>
                        "Stats"
                    </button>
                </Show>
                <button style=BUTTON_STYLE on:click=move |_| leaderboard_open.update(|v| *v = !*v)>
                    "Top wallets"
                </button>
                <button style=BUTTON_STYLE on:click=|_| toggle_fullscreen()>
                    {move || if is_fullscreen.get() { "Exit Fullscreen" } else { "Fullscreen" }}
                </button>
            </div>
        </div>
    }
}

#[component]
fn InfoRowView(row: InfoRow) -> impl IntoView {
    let color = if row.warning { "#f5a142" } else { "#e2e0d8" };
    let prefix = if row.warning { "\u{26A0} " } else { "" };
    view! {
        <div
            class:grace-period=row.warning
            style="display: flex; justify-content: space-between; gap: 12px; padding: 2px 0; font-size: 0.75rem;"
        >
            <span style="color: #9a9590; white-space: nowrap;">{prefix}{row.label}</span>
            <span style=format!("color: {color}; font-family: 'JetBrains Mono', monospace; text-align: right; word-break: break-all;")>
                {row.value}
            </span>
        </div>
    }
}

#[component]
fn SaleDetails(sale: SaleInfo) -> impl IntoView {
    let Notice(notice) = expect_context();
    let seller = sale.seller.clone();

    view! {
        <div style="margin-top: 8px; padding-top: 6px; border-top: 1px solid rgba(40,44,62,0.6); font-size: 0.75rem;">
            <div style="font-weight: 700; color: #e05555;">"FOR SALE"</div>
            <div>"Sale price: " {sale.price}</div>
            <div style="display: flex; align-items: center; gap: 6px; margin-top: 2px;">
                <span style="font-family: 'JetBrains Mono', monospace; word-break: break-all;">{sale.seller}</span>
                <button style=BUTTON_STYLE on:click=move |_| copy_address(seller.clone(), notice)>
                    "Copy"
                </button>
            </div>
        </div>
    }
}

/// Details of the selected parcel, re-derived whenever the store refreshes.
#[component]
pub fn ParcelInfoPanel() -> impl IntoView {
    let store: RwSignal<LocalStore> = expect_context();
    let SelectedParcel(selected) = expect_context();

    let info = Memo::new(move |_| {
        let pos = selected.get()?;
        Some(store.with(|s| ParcelInfo::describe(s.parcel(pos), now_secs())))
    });

    move || {
        info.get().map(|info| {
            let body = match info {
                ParcelInfo::Owned { rows, sale } => view! {
                    {rows.into_iter().map(|row| view! { <InfoRowView row=row /> }).collect_view()}
                    {sale.map(|sale| view! { <SaleDetails sale=sale /> })}
                }
                .into_any(),
                ParcelInfo::Unassigned { id, pos } => view! {
                    <div style="font-size: 0.75rem;">{format!("ID: {id}")}</div>
                    <div style="font-size: 0.75rem; color: #9a9590;">"Unassigned parcel"</div>
                    <div style="font-size: 0.75rem;">{format!("Coordinates: ({}, {})", pos.x, pos.y)}</div>
                }
                .into_any(),
                ParcelInfo::NotFound => view! {
                    <div style="font-size: 0.75rem; color: #e05555;">{NOT_FOUND}</div>
                }
                .into_any(),
            };
            view! {
                <div
                    id="parcel-info"
                    style=format!("position: absolute; right: 12px; bottom: 12px; z-index: 25; width: 320px; max-height: 70%; overflow-y: auto; padding: 10px 12px; {PANEL_STYLE}")
                >
                    <div style="display: flex; justify-content: flex-end;">
                        <button title="Close" style=CLOSE_STYLE on:click=move |_| selected.set(None)>
                            "\u{00D7}"
                        </button>
                    </div>
                    {body}
                </div>
            }
        })
    }
}

#[component]
pub fn StatusBanners() -> impl IntoView {
    let KasLandBanner(kasland) = expect_context();
    let MaintenanceBanner(maintenance) = expect_context();

    view! {
        <div style="position: absolute; top: 52px; left: 50%; transform: translateX(-50%); z-index: 22; display: flex; flex-direction: column; gap: 6px; pointer-events: none;">
            {move || maintenance.get().map(|message| view! {
                <div id="maintenance-message" style="padding: 8px 14px; border-radius: 6px; background: rgba(245,161,66,0.92); color: #0c0e17; font-weight: 700; font-size: 0.8rem;">
                    {message}
                </div>
            })}
            {move || kasland.get().map(|message| view! {
                <div id="kasland-status" style="padding: 8px 14px; border-radius: 6px; background: rgba(224,85,85,0.92); color: #fff; font-weight: 700; font-size: 0.8rem;">
                    {message}
                </div>
            })}
        </div>
    }
}

#[component]
pub fn EventPopup() -> impl IntoView {
    let AnnouncedEvent(popup) = expect_context();

    move || {
        popup.get().map(|event| {
            view! {
                <div
                    id="event-popup"
                    style=format!("position: absolute; top: 50%; left: 50%; transform: translate(-50%, -50%); z-index: 30; max-width: 380px; width: 88%; padding: 16px 20px; {PANEL_STYLE}")
                >
                    <h2 style="margin: 0 0 4px; font-size: 1rem; color: #f5c542;">"New event"</h2>
                    <div style="font-family: 'JetBrains Mono', monospace; font-size: 0.72rem; color: #9a9590; margin-bottom: 8px;">{event.kind}</div>
                    <p style="font-size: 0.8rem; margin: 0 0 8px;">{event.description}</p>
                    <p style="font-size: 0.72rem; color: #9a9590; margin: 0 0 10px;">
                        {format!("Event end: {}", format_timestamp(Some(event.end_time)))}
                    </p>
                    <button style=BUTTON_STYLE on:click=move |_| popup.set(None)>"Close"</button>
                </div>
            }
        })
    }
}

/// Short-lived message for wallet failures and clipboard confirmations.
#[component]
pub fn NoticeToast() -> impl IntoView {
    let Notice(notice) = expect_context();

    move || {
        notice.get().map(|message| {
            view! {
                <div
                    style=format!("position: absolute; bottom: 16px; left: 50%; transform: translateX(-50%); z-index: 40; display: flex; align-items: center; gap: 10px; padding: 8px 12px; font-size: 0.78rem; {PANEL_STYLE}")
                >
                    <span>{message}</span>
                    <button style=CLOSE_STYLE on:click=move |_| notice.set(None)>"\u{00D7}"</button>
                </div>
            }
        })
    }
}
