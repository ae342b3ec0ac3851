//! Bridge to the KasWare browser extension (`window.kasware`).

use std::cell::RefCell;

use js_sys::{Function, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::stats::short_address;
use crate::store::LocalStore;

const PROVIDER_KEY: &str = "kasware";
const ACCOUNTS_CHANGED: &str = "accountsChanged";
pub const CONNECT_LABEL: &str = "Connect to KasWare";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("The KasWare extension is not installed in your browser. Please install it to continue.")]
    NotInstalled,
    #[error("Failed to connect to KasWare. Please try again.")]
    Rejected { reason: String },
    #[error("unexpected response from KasWare: {0}")]
    Malformed(String),
}

impl WalletError {
    fn rejected(value: JsValue) -> Self {
        WalletError::Rejected {
            reason: value.as_string().unwrap_or_else(|| format!("{value:?}")),
        }
    }

    /// Reason suitable for the console, beyond the user-facing notice.
    pub fn detail(&self) -> String {
        match self {
            WalletError::Rejected { reason } => reason.clone(),
            other => other.to_string(),
        }
    }
}

struct AccountsChangedBinding {
    provider: JsValue,
    handler: Closure<dyn Fn(JsValue)>,
}

thread_local! {
    static ACCOUNTS_CHANGED_BINDING: RefCell<Option<AccountsChangedBinding>> = const { RefCell::new(None) };
}

fn provider() -> Option<JsValue> {
    let window = web_sys::window()?;
    let provider = Reflect::get(window.as_ref(), &JsValue::from_str(PROVIDER_KEY)).ok()?;
    (!provider.is_undefined() && !provider.is_null()).then_some(provider)
}

pub fn is_installed() -> bool {
    provider().is_some()
}

fn method(provider: &JsValue, name: &str) -> Result<Function, WalletError> {
    Reflect::get(provider, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| WalletError::Malformed(format!("missing method {name}")))
}

/// Decode the extension's account list and keep the primary account.
pub fn primary_account(accounts: Vec<String>) -> Option<String> {
    accounts.into_iter().find(|a| !a.is_empty())
}

fn decode_accounts(value: JsValue) -> Result<Option<String>, WalletError> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    let accounts: Vec<String> = serde_wasm_bindgen::from_value(value)
        .map_err(|e| WalletError::Malformed(e.to_string()))?;
    Ok(primary_account(accounts))
}

async fn call_accounts(name: &str) -> Result<Option<String>, WalletError> {
    let provider = provider().ok_or(WalletError::NotInstalled)?;
    let f = method(&provider, name)?;
    let result = f.call0(&provider).map_err(WalletError::rejected)?;
    let promise: Promise = result
        .dyn_into()
        .map_err(|_| WalletError::Malformed(format!("{name} did not return a promise")))?;
    let value = JsFuture::from(promise)
        .await
        .map_err(WalletError::rejected)?;
    decode_accounts(value)
}

/// Accounts already authorised for this site; never prompts the user.
pub async fn current_account() -> Result<Option<String>, WalletError> {
    call_accounts("getAccounts").await
}

/// Ask the extension to connect, prompting the user if needed.
pub async fn request_account() -> Result<Option<String>, WalletError> {
    call_accounts("requestAccounts").await
}

/// Subscribe to account switches in the extension. Replaces any earlier handler.
pub fn on_accounts_changed(callback: impl Fn(Option<String>) + 'static) {
    let Some(provider) = provider() else {
        return;
    };
    unbind_accounts_changed();

    let handler = Closure::<dyn Fn(JsValue)>::new(move |accounts: JsValue| {
        match decode_accounts(accounts) {
            Ok(account) => {
                log::info!("KasWare accounts changed");
                callback(account);
            }
            Err(e) => log::warn!("ignoring accountsChanged payload: {e}"),
        }
    });

    let Ok(on) = method(&provider, "on") else {
        log::warn!("KasWare provider has no event API");
        return;
    };
    if on
        .call2(
            &provider,
            &JsValue::from_str(ACCOUNTS_CHANGED),
            handler.as_ref().unchecked_ref(),
        )
        .is_ok()
    {
        ACCOUNTS_CHANGED_BINDING.with(|slot| {
            *slot.borrow_mut() = Some(AccountsChangedBinding { provider, handler });
        });
    }
}

pub fn unbind_accounts_changed() {
    ACCOUNTS_CHANGED_BINDING.with(|slot| {
        let Some(old) = slot.borrow_mut().take() else {
            return;
        };
        if let Ok(remove) = method(&old.provider, "removeListener") {
            let _ = remove.call2(
                &old.provider,
                &JsValue::from_str(ACCOUNTS_CHANGED),
                old.handler.as_ref().unchecked_ref(),
            );
        }
    });
}

/// Text on the wallet button.
pub fn button_label(account: Option<&str>) -> String {
    match account {
        Some(account) => short_address(account),
        None => CONNECT_LABEL.to_string(),
    }
}

/// `Parcel ID: 12 | 3.50 zkaspa` for the first parcel the account owns.
pub fn account_summary(store: &LocalStore, account: &str) -> String {
    match store.parcel_by_owner(account) {
        Some(parcel) => format!(
            "Parcel ID: {} | {:.2} zkaspa",
            parcel.id.unwrap_or_default(),
            parcel.zkaspa_balance.unwrap_or(0.0)
        ),
        None => "No parcel | 0.00 zkaspa".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kasland_shared::{EnergyStats, GameInfo, Parcel, ParcelsResponse};

    use crate::store::Snapshot;

    fn store_with(parcels: Vec<Parcel>) -> LocalStore {
        let mut store = LocalStore::default();
        let ticket = store.begin_refresh();
        store.complete_refresh(
            ticket,
            Ok(Snapshot::from_parts(
                ParcelsResponse {
                    map_size: 8,
                    parcels,
                },
                Vec::new(),
                GameInfo::default(),
                EnergyStats::default(),
            )),
        );
        store
    }

    #[test]
    fn summary_uses_the_owned_parcel() {
        let store = store_with(vec![Parcel {
            id: Some(12),
            x: 2,
            y: 3,
            owner_address: Some("kaspa:me".into()),
            zkaspa_balance: Some(3.5),
            ..Parcel::default()
        }]);
        assert_eq!(
            account_summary(&store, "kaspa:me"),
            "Parcel ID: 12 | 3.50 zkaspa"
        );
        assert_eq!(
            account_summary(&store, "kaspa:other"),
            "No parcel | 0.00 zkaspa"
        );
    }

    #[test]
    fn button_shows_short_address_when_connected() {
        assert_eq!(button_label(None), "Connect to KasWare");
        assert_eq!(
            button_label(Some("kaspa:qz8d5k0000000000xyzw")),
            "kaspa:...xyzw"
        );
    }

    #[test]
    fn primary_account_skips_blanks() {
        assert_eq!(primary_account(vec![]), None);
        assert_eq!(
            primary_account(vec![String::new(), "kaspa:b".into()]),
            Some("kaspa:b".into())
        );
    }

    #[test]
    fn user_notices_match_the_failure() {
        assert_eq!(
            WalletError::NotInstalled.to_string(),
            "The KasWare extension is not installed in your browser. Please install it to continue."
        );
        let rejected = WalletError::Rejected {
            reason: "User rejected the request.".into(),
        };
        assert_eq!(
            rejected.to_string(),
            "Failed to connect to KasWare. Please try again."
        );
        assert_eq!(rejected.detail(), "User rejected the request.");
    }
}
