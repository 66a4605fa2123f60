// lib.rs - Settings and mileage history core for the shop app

pub mod amount;
pub mod app_state;
pub mod client;
pub mod config_store;
pub mod configuration;
pub mod delegate;
pub mod errors;
pub mod format;
pub mod history;
pub mod push;

#[cfg(test)]
mod testing;

// Re-export common types
pub use amount::AmountValue;
pub use app_state::{SharedUserStore, UserStore};
pub use client::{
    ClientHandle, ClientProvider, DelegationStep, MobileOs, MobileType, RpcShopClient,
    SharedClientProvider, ShopClient, StepStream,
};
pub use config_store::{AppConfig, ConfigStore, HistoryConfig, NetworkConfig, PushConfig};
pub use configuration::{Configuration, PinNavigator, SettingsAlert, SettingsMenuItem};
pub use delegate::{set_delegate, toggle_quick_approval, ToggleOutcome};
pub use errors::{WalletError, WalletResult};
pub use history::{fetch_history, HistoryAction, HistoryEntry, HistoryRow};
pub use push::{PermissionStatus, PushPermission};
