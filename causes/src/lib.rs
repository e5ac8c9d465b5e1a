pub mod config;
pub mod errors;
pub mod handler;
pub mod metrics_defs;
pub mod model;
pub mod service;
pub mod store;

#[cfg(test)]
mod testutils;

use crate::config::Config;
use crate::errors::CausesError;
use crate::handler::{CauseUpsertHandler, UpdateMode};
use crate::service::CausesService;
use crate::store::KvStore;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

/// Serves the upsert endpoint and the admin endpoints until either listener fails.
pub async fn run(config: Config, store: Arc<dyn KvStore>) -> Result<(), CausesError> {
    config.validate()?;

    let update_mode = match config.conditional_update {
        true => UpdateMode::Conditional,
        false => UpdateMode::CheckThenWrite,
    };
    let handler = CauseUpsertHandler::new(store, config.table_name.clone())
        .with_update_mode(update_mode);
    let service = CausesService::new(Arc::new(handler), &config.path);

    tracing::info!(
        table_name = %config.table_name,
        path = %config.path,
        ?update_mode,
        "starting causes service"
    );

    let service_task = run_http_service(&config.listener.host, config.listener.port, service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        AdminService::<_, CausesError>::new(|| true),
    );

    tokio::try_join!(service_task, admin_task)?;
    Ok(())
}
