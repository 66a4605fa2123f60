use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::app_state::SharedUserStore;
use crate::client::{MobileOs, ShopClient};
use crate::config_store::PushConfig;
use crate::errors::{WalletError, WalletResult};

const MAX_PUSH_TOKEN_LENGTH: usize = 256;

/// Answer of the OS notification permission prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    Undetermined,
}

/// Platform helper that prompts for notification permission and stores the
/// device push token in the user store when granted.
#[async_trait]
pub trait PushPermission: Send + Sync {
    async fn request(&self, store: &SharedUserStore) -> PermissionStatus;
}

/// Register the stored device token with the ledger for the shop app.
pub async fn register_push_token(
    client: &dyn ShopClient,
    store: &SharedUserStore,
    os: MobileOs,
    config: &PushConfig,
) -> WalletResult<()> {
    let (token, lang) = store.read(|s| (s.expo_push_token.clone(), s.lang.clone()));
    let token = token.trim();
    if token.is_empty() {
        return Err(WalletError::ValidationError(
            "Push token has not been issued".to_string(),
        ));
    }
    if token.len() > MAX_PUSH_TOKEN_LENGTH {
        return Err(WalletError::ValidationError(format!(
            "Push token exceeds maximum length of {} characters",
            MAX_PUSH_TOKEN_LENGTH
        )));
    }

    let language = if lang.trim().is_empty() {
        config.language.as_str()
    } else {
        lang.trim()
    };

    log::debug!(
        "registering push token for {} ({}, {})",
        os.as_str(),
        language,
        token.len()
    );
    client
        .register_mobile_token(token, language, os, config.app_type)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::UserStore;
    use crate::testing::FakeShopClient;

    fn store_with_token(token: &str, lang: &str) -> SharedUserStore {
        let mut inner = UserStore::new("shop-1");
        inner.expo_push_token = token.to_string();
        inner.lang = lang.to_string();
        SharedUserStore::new(inner)
    }

    #[tokio::test]
    async fn registers_with_store_language() {
        let client = FakeShopClient::default();
        let store = store_with_token("ExponentPushToken[abc]", "en");

        register_push_token(&client, &store, MobileOs::Android, &PushConfig::default())
            .await
            .unwrap();
        assert_eq!(
            client.calls(),
            vec!["register:ExponentPushToken[abc]:en:android:ShopApp"]
        );
    }

    #[tokio::test]
    async fn falls_back_to_configured_language() {
        let client = FakeShopClient::default();
        let store = store_with_token("tok", "");

        register_push_token(&client, &store, MobileOs::Ios, &PushConfig::default())
            .await
            .unwrap();
        assert_eq!(client.calls(), vec!["register:tok:kr:iOS:ShopApp"]);
    }

    #[tokio::test]
    async fn missing_token_is_rejected_before_calling_ledger() {
        let client = FakeShopClient::default();
        let store = store_with_token("  ", "en");

        let result =
            register_push_token(&client, &store, MobileOs::Ios, &PushConfig::default()).await;
        assert!(matches!(result, Err(WalletError::ValidationError(_))));
        assert!(client.calls().is_empty());
    }
}
