//! Settings screen controller.
//!
//! Owns the toggle logic behind the settings list: biometric unlock, push
//! notifications and quick approval. Rendering stays in the UI layer.

use std::sync::Arc;

use crate::app_state::SharedUserStore;
use crate::client::{ClientProvider, MobileOs};
use crate::config_store::PushConfig;
use crate::delegate::{self, ToggleOutcome};
use crate::errors::WalletResult;
use crate::push::{self, PermissionStatus, PushPermission};

/// Screens reachable only after PIN entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextScreen {
    SetPincode,
    WalletManager,
}

impl NextScreen {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextScreen::SetPincode => "setPincode",
            NextScreen::WalletManager => "WalletManager",
        }
    }
}

/// PIN-code overlay owned by the navigation layer.
pub trait PinNavigator: Send + Sync {
    /// Hide the overlay in enter mode with no pending success.
    fn reset_to_enter(&self);

    /// Show the overlay; on success the app moves to `next`.
    fn request_pin(&self, next: NextScreen, use_footer: bool);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsMenuItem {
    SetPincode,
    Biometrics,
    WalletManager,
    PushNotification,
    QuickApproval,
    Version,
}

impl SettingsMenuItem {
    pub const ALL: [SettingsMenuItem; 6] = [
        SettingsMenuItem::SetPincode,
        SettingsMenuItem::Biometrics,
        SettingsMenuItem::WalletManager,
        SettingsMenuItem::PushNotification,
        SettingsMenuItem::QuickApproval,
        SettingsMenuItem::Version,
    ];

    /// Stable list key.
    pub fn id(&self) -> &'static str {
        match self {
            SettingsMenuItem::SetPincode => "bd7acbea",
            SettingsMenuItem::Biometrics => "3ac68afc",
            SettingsMenuItem::WalletManager => "58694a0f",
            SettingsMenuItem::PushNotification => "4a0f5869",
            SettingsMenuItem::QuickApproval => "f44a0869",
            SettingsMenuItem::Version => "cb69423sg",
        }
    }

    /// Translation key of the caption. The version row is built by [`version_label`].
    pub fn label_key(&self) -> Option<&'static str> {
        match self {
            SettingsMenuItem::SetPincode => Some("config.menu.a"),
            SettingsMenuItem::Biometrics => Some("config.menu.b"),
            SettingsMenuItem::WalletManager => Some("config.menu.c"),
            SettingsMenuItem::PushNotification => Some("config.menu.d"),
            SettingsMenuItem::QuickApproval => Some("config.menu.e"),
            SettingsMenuItem::Version => None,
        }
    }
}

/// Trailing widget of a settings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuControl {
    Switch(bool),
    Arrow,
    Nothing,
}

/// User-visible alert raised by a settings action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsAlert {
    NotificationPermissionDenied,
    PushRegistrationFailed(String),
    QuickApprovalFailed(String),
}

impl SettingsAlert {
    pub fn message_key(&self) -> &'static str {
        match self {
            SettingsAlert::NotificationPermissionDenied => "permission.body.text.b",
            SettingsAlert::PushRegistrationFailed(_) => "secret.alert.push.fail",
            SettingsAlert::QuickApprovalFailed(_) => "config.alert.quick.fail",
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            SettingsAlert::NotificationPermissionDenied => None,
            SettingsAlert::PushRegistrationFailed(detail)
            | SettingsAlert::QuickApprovalFailed(detail) => Some(detail),
        }
    }
}

/// `Version : {version}/{bundle} ({env}) `
pub fn version_label(version: &str, bundle_code: &str, environment: &str) -> String {
    format!("Version : {}/{} ({}) ", version, bundle_code, environment)
}

pub struct Configuration {
    store: SharedUserStore,
    provider: Arc<dyn ClientProvider>,
    permissions: Arc<dyn PushPermission>,
    navigator: Arc<dyn PinNavigator>,
    push_config: PushConfig,
    os: MobileOs,
}

impl Configuration {
    pub fn new(
        store: SharedUserStore,
        provider: Arc<dyn ClientProvider>,
        permissions: Arc<dyn PushPermission>,
        navigator: Arc<dyn PinNavigator>,
        push_config: PushConfig,
        os: MobileOs,
    ) -> Self {
        Self {
            store,
            provider,
            permissions,
            navigator,
            push_config,
            os,
        }
    }

    /// Called when the screen mounts.
    pub fn enter(&self) {
        self.navigator.reset_to_enter();
    }

    pub fn control(&self, item: SettingsMenuItem) -> MenuControl {
        let state = self.store.snapshot();
        match item {
            SettingsMenuItem::Biometrics => MenuControl::Switch(state.enable_bio),
            SettingsMenuItem::PushNotification => MenuControl::Switch(state.registered_push_token),
            SettingsMenuItem::QuickApproval => MenuControl::Switch(state.quick_approval),
            SettingsMenuItem::Version => MenuControl::Nothing,
            SettingsMenuItem::SetPincode | SettingsMenuItem::WalletManager => MenuControl::Arrow,
        }
    }

    /// Row press. Only the PIN-protected rows navigate.
    pub fn select(&self, item: SettingsMenuItem) {
        log::debug!("settings item selected: {}", item.id());
        match item {
            SettingsMenuItem::SetPincode => self.navigator.request_pin(NextScreen::SetPincode, true),
            SettingsMenuItem::WalletManager => {
                self.navigator.request_pin(NextScreen::WalletManager, true)
            }
            _ => {}
        }
    }

    pub fn toggle_bio_authentication(&self, enabled: bool) {
        log::info!("biometric authentication: {}", enabled);
        self.store.set_enable_bio(enabled);
    }

    /// Returns an alert when the permission is denied or registration fails.
    pub async fn toggle_push_notification(&self, enabled: bool) -> Option<SettingsAlert> {
        log::info!("push notification: {}", enabled);
        let status = self.permissions.request(&self.store).await;

        let mut alert = None;
        if status == PermissionStatus::Denied {
            alert = Some(SettingsAlert::NotificationPermissionDenied);
        }

        if enabled && status == PermissionStatus::Granted {
            let registered: WalletResult<()> = async {
                let handle = self.provider.client().await?;
                push::register_push_token(
                    handle.client.as_ref(),
                    &self.store,
                    self.os,
                    &self.push_config,
                )
                .await
            }
            .await;

            match registered {
                Ok(()) => self.store.set_registered_push_token(true),
                Err(err) => {
                    log::error!("push token registration failed: {}", err);
                    alert = Some(SettingsAlert::PushRegistrationFailed(err.to_string()));
                }
            }
        } else {
            self.store.set_registered_push_token(false);
        }
        alert
    }

    pub async fn toggle_quick_approval(&self, enabled: bool) -> Option<SettingsAlert> {
        match delegate::toggle_quick_approval(&self.store, self.provider.as_ref(), enabled).await {
            ToggleOutcome::Failed(err) => Some(SettingsAlert::QuickApprovalFailed(err.to_string())),
            ToggleOutcome::Applied(_) | ToggleOutcome::Unchanged => None,
        }
    }
}
