use std::sync::Arc;

use parking_lot::RwLock;

/// Preference and progress flags owned by the UI layer.
///
/// Workflows read and write individual fields through [`SharedUserStore`];
/// the struct itself is never replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStore {
    pub shop_id: String,
    pub lang: String,
    pub expo_push_token: String,
    pub enable_bio: bool,
    pub registered_push_token: bool,
    pub quick_approval: bool,
    pub loading: bool,
}

impl UserStore {
    pub fn new(shop_id: impl Into<String>) -> Self {
        Self {
            shop_id: shop_id.into(),
            lang: "kr".to_string(),
            ..Self::default()
        }
    }
}

/// Shared handle passed to the settings and history controllers.
#[derive(Debug, Clone, Default)]
pub struct SharedUserStore(pub Arc<RwLock<UserStore>>);

impl SharedUserStore {
    pub fn new(inner: UserStore) -> Self {
        Self(Arc::new(RwLock::new(inner)))
    }

    pub fn read<F, T>(&self, op: F) -> T
    where
        F: FnOnce(&UserStore) -> T,
    {
        let guard = self.0.read();
        op(&guard)
    }

    pub fn write<F, T>(&self, op: F) -> T
    where
        F: FnOnce(&mut UserStore) -> T,
    {
        let mut guard = self.0.write();
        op(&mut guard)
    }

    pub fn snapshot(&self) -> UserStore {
        self.0.read().clone()
    }

    pub fn shop_id(&self) -> String {
        self.read(|store| store.shop_id.clone())
    }

    pub fn set_enable_bio(&self, enabled: bool) {
        self.write(|store| store.enable_bio = enabled);
    }

    pub fn set_registered_push_token(&self, registered: bool) {
        self.write(|store| store.registered_push_token = registered);
    }

    pub fn set_quick_approval(&self, enabled: bool) {
        self.write(|store| store.quick_approval = enabled);
    }

    pub fn set_loading(&self, loading: bool) {
        self.write(|store| store.loading = loading);
    }
}
