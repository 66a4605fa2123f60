//! Quick-approval delegation.
//!
//! Enabling or disabling the delegate is a multi-step remote operation. The
//! shop backend reports progress as a stream of [`DelegationStep`]s and the
//! operation only counts as applied when exactly three steps arrive and the
//! last one is `done`.

use futures::StreamExt;

use crate::app_state::SharedUserStore;
use crate::client::{ClientProvider, DelegationStep, ShopClient, STEP_DONE};
use crate::errors::{WalletError, WalletResult};

/// Number of steps a completed delegate operation reports.
pub const EXPECTED_STEP_COUNT: usize = 3;

/// Result of a quick-approval toggle as seen by the settings screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The remote operation completed; the flag now holds this value.
    Applied(bool),
    /// The operation finished without the completion step. Flag untouched.
    Unchanged,
    /// The operation raised an error. Flag untouched; show an alert.
    Failed(WalletError),
}

/// Create or remove the shop's delegate and report whether it completed.
///
/// The step stream is drained one step at a time. Errors from the stream
/// propagate; a stream of the wrong shape is `Ok(false)`.
pub async fn set_delegate(
    enable: bool,
    shop_id: &str,
    client: &dyn ShopClient,
) -> WalletResult<bool> {
    let operation = if enable {
        "createDelegate"
    } else {
        "removeDelegate"
    };
    let mut stream = if enable {
        client.create_delegate(shop_id).await?
    } else {
        client.remove_delegate(shop_id).await?
    };

    let mut steps = Vec::with_capacity(EXPECTED_STEP_COUNT);
    while let Some(step) = stream.next().await {
        let step = step?;
        log::debug!("{} step {}: {}", operation, steps.len() + 1, step.key);
        steps.push(step);
    }

    let completed = is_completed(&steps);
    if !completed {
        log::warn!(
            "{} for shop {} ended without completion ({} steps, last key {:?})",
            operation,
            shop_id,
            steps.len(),
            steps.last().map(|s| s.key.as_str())
        );
    }
    Ok(completed)
}

/// Exactly three steps, the third keyed `done`.
pub fn is_completed(steps: &[DelegationStep]) -> bool {
    steps.len() == EXPECTED_STEP_COUNT && steps[EXPECTED_STEP_COUNT - 1].key == STEP_DONE
}

/// Settings-screen wrapper around [`set_delegate`].
///
/// Marks the store as loading for the whole call and writes
/// `quick_approval` only on completion. Errors are logged and returned as
/// [`ToggleOutcome::Failed`]; nothing is retried. Callers must not start a
/// second toggle while one is pending.
pub async fn toggle_quick_approval(
    store: &SharedUserStore,
    provider: &dyn ClientProvider,
    enable: bool,
) -> ToggleOutcome {
    log::info!("toggleQuickApproval: {}", enable);
    let _loading = LoadingGuard::start(store);

    let result: WalletResult<bool> = async {
        let handle = provider.client().await?;
        set_delegate(enable, &store.shop_id(), handle.client.as_ref()).await
    }
    .await;

    match result {
        Ok(true) => {
            store.set_quick_approval(enable);
            ToggleOutcome::Applied(enable)
        }
        Ok(false) => ToggleOutcome::Unchanged,
        Err(err) => {
            log::error!("quick approval toggle failed: {}", err);
            ToggleOutcome::Failed(err)
        }
    }
}

struct LoadingGuard<'a> {
    store: &'a SharedUserStore,
}

impl<'a> LoadingGuard<'a> {
    fn start(store: &'a SharedUserStore) -> Self {
        store.set_loading(true);
        Self { store }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.store.set_loading(false);
    }
}
