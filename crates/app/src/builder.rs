//! Application configuration and sealing.

use crate::app::App;
use crate::handler::{AnteHandler, BeginBlocker, EndBlocker, InitChainer};
use crate::router::{Handler, Router};
use ledgerkit_storage::{CommitKvStore, CommitMultiStore, Db, PruningStrategy, StoreConstructor};
use ledgerkit_types::{AppError, GasPrice, StoreKey, TxDecoder};
use std::sync::Arc;

/// Configuration carried into the sealed [`App`].
pub(crate) struct AppConfig {
    pub name: String,
    pub app_version: String,
    pub router: Router,
    pub tx_decoder: TxDecoder,
    pub ante_handler: Option<AnteHandler>,
    pub init_chainer: Option<InitChainer>,
    pub begin_blocker: Option<BeginBlocker>,
    pub end_blocker: Option<EndBlocker>,
    pub min_gas_prices: Arc<Vec<GasPrice>>,
}

/// The unsealed configuration surface of an application.
///
/// Every option, handler, route and store mount is set here;
/// [`load_latest_version`](Self::load_latest_version) or
/// [`load_version`](Self::load_version) consumes the builder, loads the
/// multi-store, and returns the sealed [`App`]. Once sealed there is no
/// setter left to call — configuration is fixed by construction, not by a
/// runtime flag.
pub struct AppBuilder {
    name: String,
    app_version: String,
    db: Arc<dyn Db>,
    cms: Option<CommitMultiStore>,
    pruning: PruningStrategy,
    mounts: Vec<(StoreKey, StoreConstructor)>,
    router: Router,
    tx_decoder: Option<TxDecoder>,
    ante_handler: Option<AnteHandler>,
    init_chainer: Option<InitChainer>,
    begin_blocker: Option<BeginBlocker>,
    end_blocker: Option<EndBlocker>,
    min_gas_prices: Vec<GasPrice>,
}

impl AppBuilder {
    /// Start configuring an application over the given database.
    ///
    /// # Panics
    ///
    /// Panics on an empty name.
    pub fn new(name: &str, db: Arc<dyn Db>) -> Self {
        assert!(!name.is_empty(), "application name must be non-empty");
        Self {
            name: name.to_string(),
            app_version: String::new(),
            db,
            cms: None,
            pruning: PruningStrategy::default(),
            mounts: Vec::new(),
            router: Router::new(),
            tx_decoder: None,
            ante_handler: None,
            init_chainer: None,
            begin_blocker: None,
            end_blocker: None,
            min_gas_prices: Vec::new(),
        }
    }

    /// Set the free-form application version string.
    pub fn with_app_version(mut self, version: &str) -> Self {
        self.app_version = version.to_string();
        self
    }

    /// Install the transaction decoder.
    pub fn with_tx_decoder(mut self, decoder: TxDecoder) -> Self {
        self.tx_decoder = Some(decoder);
        self
    }

    /// Install the ante handler.
    pub fn with_ante_handler(mut self, ante: AnteHandler) -> Self {
        self.ante_handler = Some(ante);
        self
    }

    /// Install the init chainer.
    pub fn with_init_chainer(mut self, init_chainer: InitChainer) -> Self {
        self.init_chainer = Some(init_chainer);
        self
    }

    /// Install the begin blocker.
    pub fn with_begin_blocker(mut self, begin_blocker: BeginBlocker) -> Self {
        self.begin_blocker = Some(begin_blocker);
        self
    }

    /// Install the end blocker.
    pub fn with_end_blocker(mut self, end_blocker: EndBlocker) -> Self {
        self.end_blocker = Some(end_blocker);
        self
    }

    /// Set the minimum gas price vector used as the CheckTx admission
    /// policy.
    pub fn with_min_gas_prices(mut self, prices: Vec<GasPrice>) -> Self {
        self.min_gas_prices = prices;
        self
    }

    /// Set the version retention policy for all mounted stores.
    pub fn with_pruning(mut self, pruning: PruningStrategy) -> Self {
        self.pruning = pruning;
        self
    }

    /// Replace the multi-store with a pre-built one. Mounts and pruning
    /// configured on the builder still apply to it.
    pub fn with_commit_multi_store(mut self, cms: CommitMultiStore) -> Self {
        self.cms = Some(cms);
        self
    }

    /// Register a message handler under a route name.
    ///
    /// # Panics
    ///
    /// Panics on an invalid or duplicate route name.
    pub fn add_route(mut self, name: &str, handler: Arc<dyn Handler>) -> Self {
        self.router.add_route(name, handler);
        self
    }

    /// Register a store to be mounted at load time.
    ///
    /// The constructor closes over whichever database the engine persists
    /// into, so stores can live in databases other than the app's own.
    pub fn mount_store(mut self, key: StoreKey, constructor: StoreConstructor) -> Self {
        self.mounts.push((key, constructor));
        self
    }

    /// Register a store whose engine persists into an explicit database.
    ///
    /// `constructor` is invoked at load time with `db` and the store key;
    /// the database binding is made here rather than baked into the closure,
    /// so one constructor can serve stores over different databases.
    pub fn mount_store_with_db<D>(
        mut self,
        key: StoreKey,
        constructor: impl Fn(D, &StoreKey) -> Arc<dyn CommitKvStore> + Send + Sync + 'static,
        db: D,
    ) -> Self
    where
        D: Clone + Send + Sync + 'static,
    {
        let bound: StoreConstructor = Arc::new(move |key: &StoreKey| constructor(db.clone(), key));
        self.mounts.push((key, bound));
        self
    }

    /// Mount everything, load the highest committed version, and seal.
    pub fn load_latest_version(self) -> Result<App, AppError> {
        self.load(None)
    }

    /// Mount everything, load a specific version, and seal.
    pub fn load_version(self, version: i64) -> Result<App, AppError> {
        self.load(Some(version))
    }

    fn load(self, version: Option<i64>) -> Result<App, AppError> {
        let mut cms = self
            .cms
            .unwrap_or_else(|| CommitMultiStore::new(self.db.clone()));
        cms.set_pruning(self.pruning);
        for (key, constructor) in &self.mounts {
            cms.mount(key.clone(), constructor);
        }
        match version {
            None => cms.load_latest_version()?,
            Some(v) => cms.load_version(v)?,
        }

        let tx_decoder = self.tx_decoder.unwrap_or_else(|| {
            Arc::new(|_bytes: &[u8]| {
                Err(AppError::TxDecode("no tx decoder configured".to_string()))
            })
        });

        Ok(App::seal(
            cms,
            AppConfig {
                name: self.name,
                app_version: self.app_version,
                router: self.router,
                tx_decoder,
                ante_handler: self.ante_handler,
                init_chainer: self.init_chainer,
                begin_blocker: self.begin_blocker,
                end_blocker: self.end_blocker,
                min_gas_prices: Arc::new(self.min_gas_prices),
            },
        ))
    }
}
