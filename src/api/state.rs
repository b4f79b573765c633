// src/api/state.rs
use crate::compile::{CompileOrchestrator, RequestGate};
use crate::config::AppConfig;
use crate::stats::StatsClient;
use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub client: Client,
    pub db_pool: SqlitePool,
    pub gate: RequestGate,
    pub compiler: CompileOrchestrator,
    pub stats: StatsClient,
}

impl AppState {
    /// State backed by the real `qat` executable.
    pub fn new(config: AppConfig, db_pool: SqlitePool) -> Self {
        let compiler = CompileOrchestrator::from_config(&config);
        Self::with_compiler(config, db_pool, compiler)
    }

    pub fn with_compiler(config: AppConfig, db_pool: SqlitePool, compiler: CompileOrchestrator) -> Self {
        let client = Client::new();
        Self {
            gate: RequestGate::new(config.confirmation_key.clone()),
            stats: StatsClient::new(client.clone(), config.wakatime_api_base.clone()),
            config: Arc::new(config),
            client,
            db_pool,
            compiler,
        }
    }
}
