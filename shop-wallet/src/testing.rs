//! Scripted [`ShopClient`] for unit tests.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;

use crate::client::{
    DelegationStep, EstimatedProvideRecord, MobileOs, MobileType, ShopClient, StepStream,
    TradeHistoryPage, TradeHistoryQuery,
};
use crate::errors::{WalletError, WalletResult};

#[derive(Debug, Clone)]
pub enum Script {
    Steps(Vec<DelegationStep>),
    FailAfter(Vec<DelegationStep>, WalletError),
    Fail(WalletError),
}

impl Script {
    fn into_stream(self) -> WalletResult<StepStream> {
        match self {
            Script::Steps(steps) => Ok(stream::iter(steps.into_iter().map(Ok)).boxed()),
            Script::FailAfter(steps, err) => Ok(stream::iter(
                steps.into_iter().map(Ok).chain(std::iter::once(Err(err))),
            )
            .boxed()),
            Script::Fail(err) => Err(err),
        }
    }
}

pub struct FakeShopClient {
    create: Script,
    remove: Script,
    estimated: WalletResult<Vec<EstimatedProvideRecord>>,
    trades: WalletResult<TradeHistoryPage>,
    register_error: Option<WalletError>,
    calls: Mutex<Vec<String>>,
    last_query: Mutex<Option<TradeHistoryQuery>>,
}

impl Default for FakeShopClient {
    fn default() -> Self {
        Self {
            create: Script::Steps(Vec::new()),
            remove: Script::Steps(Vec::new()),
            estimated: Ok(Vec::new()),
            trades: Ok(TradeHistoryPage::default()),
            register_error: None,
            calls: Mutex::new(Vec::new()),
            last_query: Mutex::new(None),
        }
    }
}

impl FakeShopClient {
    pub fn with_create(mut self, script: Script) -> Self {
        self.create = script;
        self
    }

    pub fn with_remove(mut self, script: Script) -> Self {
        self.remove = script;
        self
    }

    pub fn with_estimated(mut self, estimated: WalletResult<Vec<EstimatedProvideRecord>>) -> Self {
        self.estimated = estimated;
        self
    }

    pub fn with_trades(mut self, trades: WalletResult<TradeHistoryPage>) -> Self {
        self.trades = trades;
        self
    }

    pub fn with_register_error(mut self, err: WalletError) -> Self {
        self.register_error = Some(err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn last_query(&self) -> Option<TradeHistoryQuery> {
        self.last_query.lock().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl ShopClient for FakeShopClient {
    async fn create_delegate(&self, shop_id: &str) -> WalletResult<StepStream> {
        self.record(format!("create:{}", shop_id));
        self.create.clone().into_stream()
    }

    async fn remove_delegate(&self, shop_id: &str) -> WalletResult<StepStream> {
        self.record(format!("remove:{}", shop_id));
        self.remove.clone().into_stream()
    }

    async fn get_estimated_provide_history(
        &self,
        shop_id: &str,
    ) -> WalletResult<Vec<EstimatedProvideRecord>> {
        self.record(format!("estimated:{}", shop_id));
        self.estimated.clone()
    }

    async fn get_provide_and_use_trade_history(
        &self,
        shop_id: &str,
        query: &TradeHistoryQuery,
    ) -> WalletResult<TradeHistoryPage> {
        self.record(format!("trades:{}", shop_id));
        *self.last_query.lock() = Some(query.clone());
        self.trades.clone()
    }

    async fn register_mobile_token(
        &self,
        token: &str,
        language: &str,
        os: MobileOs,
        app_type: MobileType,
    ) -> WalletResult<()> {
        self.record(format!(
            "register:{}:{}:{}:{:?}",
            token,
            language,
            os.as_str(),
            app_type
        ));
        match &self.register_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
