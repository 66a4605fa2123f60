//! Mileage provide/use history.
//!
//! Two backend collections feed the history list: scheduled (estimated)
//! provides that have not settled yet, and the settled trade history. Both
//! are normalized into [`HistoryEntry`], merged, and ordered newest first.

use chrono::{Datelike, Local, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

use crate::amount::AmountValue;
use crate::app_state::SharedUserStore;
use crate::client::{
    ClientProvider, EstimatedProvideRecord, ShopClient, TradeHistoryQuery, TradeHistoryRecord,
};
use crate::config_store::HistoryConfig;
use crate::errors::{WalletError, WalletResult};
use crate::format::{convert_proper_value, time_padding};

/// Trade action code for a provide.
pub const ACTION_PROVIDED: i64 = 1;
/// Trade action code for a use or its cancellation.
pub const ACTION_USED: i64 = 2;
/// Characters dropped from a scheduled `providedAmount`.
pub const SCHEDULED_AMOUNT_SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryAction {
    #[serde(rename = "PROVIDED")]
    Provided,
    #[serde(rename = "USED")]
    Used,
    #[serde(rename = "CANCEL")]
    Cancelled,
    #[serde(rename = "SCHEDULED")]
    Scheduled,
}

impl HistoryAction {
    /// Translation key of the row caption.
    pub fn label_key(&self) -> &'static str {
        match self {
            HistoryAction::Scheduled => "wallet.history.body.text.e",
            HistoryAction::Cancelled => "wallet.history.body.text.a",
            HistoryAction::Provided => "wallet.history.body.text.d",
            HistoryAction::Used => "wallet.history.body.text.c",
        }
    }

    /// Uses credit the shop, everything else debits it.
    pub fn sign(&self) -> char {
        match self {
            HistoryAction::Used => '+',
            _ => '-',
        }
    }
}

/// One row of the merged history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub action: HistoryAction,
    /// Action code as reported by the backend
    pub action_code: i64,
    /// Smallest-unit amount shown in the list
    pub amount: String,
    /// Amount field the entry was derived from, when it differs from `amount`
    pub raw_amount: Option<String>,
    pub currency: String,
    /// Unix seconds
    pub timestamp: i64,
}

impl HistoryEntry {
    pub fn from_scheduled(record: EstimatedProvideRecord) -> Self {
        let amount = strip_fixed_suffix(&record.provided_amount);
        Self {
            id: format!("{}{}", record.timestamp, record.purchase_id),
            action: HistoryAction::Scheduled,
            action_code: record.action,
            amount,
            raw_amount: Some(record.provided_amount),
            currency: record.currency,
            timestamp: record.timestamp,
        }
    }

    /// `None` for action codes other than provide and use.
    pub fn from_trade(record: TradeHistoryRecord) -> Option<Self> {
        let action = match record.action {
            ACTION_PROVIDED => HistoryAction::Provided,
            ACTION_USED if record.cancel => HistoryAction::Cancelled,
            ACTION_USED => HistoryAction::Used,
            _ => return None,
        };
        let raw_amount = if record.action == ACTION_PROVIDED {
            record.provided_amount
        } else {
            Some(record.increase.clone())
        };

        Some(Self {
            id: record.id,
            action,
            action_code: record.action,
            amount: record.increase,
            raw_amount,
            currency: record.currency,
            timestamp: record.block_timestamp,
        })
    }
}

// Drops the last nine characters; shorter inputs become empty.
fn strip_fixed_suffix(value: &str) -> String {
    let keep = value
        .chars()
        .count()
        .saturating_sub(SCHEDULED_AMOUNT_SUFFIX_LEN);
    value.chars().take(keep).collect()
}

/// Concatenate scheduled then trade entries and order by timestamp, newest
/// first. Equal timestamps keep their concatenation order.
pub fn merge_history(scheduled: Vec<HistoryEntry>, trades: Vec<HistoryEntry>) -> Vec<HistoryEntry> {
    let mut history = scheduled;
    history.extend(trades);
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    history
}

/// Query for the first page of the trade history.
pub fn first_page_query(config: &HistoryConfig) -> TradeHistoryQuery {
    TradeHistoryQuery {
        limit: config.page_size,
        skip: 0,
        sort_direction: config.sort_direction,
        sort_by: config.sort_by.clone(),
    }
}

/// Fetch both collections and return the merged history. Fetch errors propagate.
pub async fn fetch_history(
    shop_id: &str,
    client: &dyn ShopClient,
    config: &HistoryConfig,
) -> WalletResult<Vec<HistoryEntry>> {
    let estimated = client.get_estimated_provide_history(shop_id).await?;
    log::debug!("estimated provide history: {} records", estimated.len());
    let scheduled: Vec<HistoryEntry> = estimated
        .into_iter()
        .map(HistoryEntry::from_scheduled)
        .collect();

    let page = client
        .get_provide_and_use_trade_history(shop_id, &first_page_query(config))
        .await?;
    log::debug!("trade history: {} records", page.shop_trade_histories.len());
    let trades: Vec<HistoryEntry> = page
        .shop_trade_histories
        .into_iter()
        .filter_map(HistoryEntry::from_trade)
        .collect();

    let history = merge_history(scheduled, trades);
    log::info!("history for shop {}: {} entries", shop_id, history.len());
    Ok(history)
}

/// Screen entry point: obtain a client, then [`fetch_history`] for the current shop.
pub async fn load_history(
    store: &SharedUserStore,
    provider: &dyn ClientProvider,
    config: &HistoryConfig,
) -> WalletResult<Vec<HistoryEntry>> {
    let handle = provider.client().await?;
    log::debug!("loading history for wallet {}", handle.address);
    fetch_history(&store.shop_id(), handle.client.as_ref(), config).await
}

/// Display-ready history row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRow {
    pub id: String,
    pub label_key: &'static str,
    pub time: String,
    pub amount_text: String,
}

/// Header subtitle of the history screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistorySubtitle {
    Nothing,
    Count(usize),
}

pub fn history_subtitle(entries: &[HistoryEntry]) -> HistorySubtitle {
    if entries.is_empty() {
        HistorySubtitle::Nothing
    } else {
        HistorySubtitle::Count(entries.len())
    }
}

/// `YYYY/MM/DD HH:MM:SS` in the given time zone.
pub fn format_block_time<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> WalletResult<String> {
    let time = tz.timestamp_opt(timestamp, 0).single().ok_or_else(|| {
        WalletError::InvalidResponse(format!("Timestamp out of range: {}", timestamp))
    })?;

    Ok(format!(
        "{}/{:02}/{} {}:{}:{}",
        time.year(),
        time.month(),
        time_padding(time.day()),
        time_padding(time.hour()),
        time_padding(time.minute()),
        time_padding(time.second())
    ))
}

pub fn render_row_in<Tz: TimeZone>(
    entry: &HistoryEntry,
    decimals: u8,
    tz: &Tz,
) -> WalletResult<HistoryRow> {
    let amount = AmountValue::from_base_units_str(&entry.amount, decimals)?;
    let amount_text = format!(
        "{}{} {}",
        entry.action.sign(),
        convert_proper_value(&amount.to_display_string(), &entry.currency),
        entry.currency.to_uppercase()
    );

    Ok(HistoryRow {
        id: entry.id.clone(),
        label_key: entry.action.label_key(),
        time: format_block_time(entry.timestamp, tz)?,
        amount_text,
    })
}

/// Render rows in local time. Entries whose amount cannot be parsed are skipped.
pub fn render_rows(entries: &[HistoryEntry], decimals: u8) -> Vec<HistoryRow> {
    entries
        .iter()
        .filter_map(|entry| match render_row_in(entry, decimals, &Local) {
            Ok(row) => Some(row),
            Err(err) => {
                log::warn!("skipping history entry {}: {}", entry.id, err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TradeHistoryPage;
    use crate::testing::FakeShopClient;
    use chrono::Utc;

    fn scheduled(timestamp: i64, purchase_id: &str, amount: &str) -> EstimatedProvideRecord {
        EstimatedProvideRecord {
            timestamp,
            purchase_id: purchase_id.to_string(),
            action: 1,
            provided_amount: amount.to_string(),
            currency: "point".to_string(),
        }
    }

    fn trade(id: &str, action: i64, cancel: bool, timestamp: i64) -> TradeHistoryRecord {
        TradeHistoryRecord {
            id: id.to_string(),
            action,
            increase: "2000000000".to_string(),
            provided_amount: Some("2000000000".to_string()),
            currency: "point".to_string(),
            cancel,
            block_timestamp: timestamp,
        }
    }

    #[test]
    fn scheduled_entry_synthesizes_id_and_strips_suffix() {
        let entry = HistoryEntry::from_scheduled(scheduled(1700, "P-01", "5000000000000"));
        assert_eq!(entry.id, "1700P-01");
        assert_eq!(entry.action, HistoryAction::Scheduled);
        assert_eq!(entry.amount, "5000");
        assert_eq!(entry.raw_amount.as_deref(), Some("5000000000000"));

        let short = HistoryEntry::from_scheduled(scheduled(1, "P", "12345"));
        assert_eq!(short.amount, "");
    }

    #[test]
    fn trade_actions_map_to_names_and_others_are_dropped() {
        let provided = HistoryEntry::from_trade(trade("a", 1, false, 10)).unwrap();
        assert_eq!(provided.action, HistoryAction::Provided);

        let used = HistoryEntry::from_trade(trade("b", 2, false, 10)).unwrap();
        assert_eq!(used.action, HistoryAction::Used);

        let cancelled = HistoryEntry::from_trade(trade("c", 2, true, 10)).unwrap();
        assert_eq!(cancelled.action, HistoryAction::Cancelled);

        assert!(HistoryEntry::from_trade(trade("d", 3, false, 10)).is_none());
        assert!(HistoryEntry::from_trade(trade("e", 0, false, 10)).is_none());
    }

    #[test]
    fn merge_orders_newest_first_and_keeps_ties_stable() {
        let scheduled = vec![
            HistoryEntry::from_scheduled(scheduled(100, "s1", "1000000000")),
            HistoryEntry::from_scheduled(scheduled(50, "s2", "1000000000")),
        ];
        let trades = vec![
            HistoryEntry::from_trade(trade("t1", 1, false, 200)).unwrap(),
            HistoryEntry::from_trade(trade("t2", 2, false, 50)).unwrap(),
        ];

        let merged = merge_history(scheduled, trades);
        let ids: Vec<&str> = merged.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "100s1", "50s2", "t2"]);
    }

    #[tokio::test]
    async fn fetch_history_merges_and_filters() {
        let client = FakeShopClient::default()
            .with_estimated(Ok(vec![scheduled(100, "p1", "7000000000000")]))
            .with_trades(Ok(TradeHistoryPage {
                shop_trade_histories: vec![
                    trade("t-200", 1, false, 200),
                    trade("t-150", 3, false, 150),
                    trade("t-50", 2, true, 50),
                ],
            }));

        let history = fetch_history("shop-1", &client, &HistoryConfig::default())
            .await
            .unwrap();
        let stamps: Vec<i64> = history.iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![200, 100, 50]);
        assert!(history.iter().all(|e| e.id != "t-150"));

        let query = client.last_query().unwrap();
        assert_eq!(query.limit, 100);
        assert_eq!(query.skip, 0);
        assert_eq!(query.sort_by, "blockNumber");
    }

    #[tokio::test]
    async fn fetch_errors_propagate() {
        let client = FakeShopClient::default()
            .with_trades(Err(WalletError::NetworkError("offline".into())));

        let result = fetch_history("shop-1", &client, &HistoryConfig::default()).await;
        assert_eq!(result, Err(WalletError::NetworkError("offline".into())));
    }

    #[test]
    fn block_time_is_zero_padded() {
        let time = format_block_time(1_700_000_005, &Utc).unwrap();
        assert_eq!(time, "2023/11/14 22:13:25");
        assert_eq!(format_block_time(0, &Utc).unwrap(), "1970/01/01 00:00:00");
    }

    #[test]
    fn rows_show_sign_amount_and_currency() {
        let used = HistoryEntry::from_trade(TradeHistoryRecord {
            increase: "1234567890000".to_string(),
            ..trade("u", 2, false, 0)
        })
        .unwrap();
        let row = render_row_in(&used, 9, &Utc).unwrap();
        assert_eq!(row.amount_text, "+1,234.56 POINT");
        assert_eq!(row.label_key, "wallet.history.body.text.c");

        let mut krw = used.clone();
        krw.action = HistoryAction::Provided;
        krw.currency = "krw".to_string();
        let row = render_row_in(&krw, 9, &Utc).unwrap();
        assert_eq!(row.amount_text, "-1,234 KRW");
    }

    #[test]
    fn unparsable_amounts_are_skipped() {
        let bad = HistoryEntry::from_scheduled(scheduled(1, "p", "123"));
        let good = HistoryEntry::from_trade(trade("g", 1, false, 1)).unwrap();
        let rows = render_rows(&[bad, good], 9);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "g");
    }

    #[test]
    fn subtitle_counts_entries() {
        assert_eq!(history_subtitle(&[]), HistorySubtitle::Nothing);
        let entry = HistoryEntry::from_trade(trade("x", 1, false, 1)).unwrap();
        assert_eq!(history_subtitle(&[entry]), HistorySubtitle::Count(1));
    }
}
