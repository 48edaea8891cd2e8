use std::sync::Arc;

use pagegrid::config::PageGridConfig;
use pagegrid::services::cache::{CacheBackend, CacheStore, FileBackend, MemoryBackend};
use pagegrid::services::gateway::HttpPageGateway;
use pagegrid::services::sync;
use pagegrid::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();

    let config = PageGridConfig::from_env().expect("invalid configuration");

    let gateway = HttpPageGateway::new(
        &config.base_url,
        &config.tenant,
        config.request_timeout,
        config.connect_timeout,
    )
    .expect("http client init failed");

    let backend: Arc<dyn CacheBackend> = match &config.cache_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "file cache enabled");
            Arc::new(FileBackend::new(dir.clone()))
        }
        None => Arc::new(MemoryBackend::new()),
    };
    let cache = Arc::new(CacheStore::new(backend, config.cache_debounce));
    let state = AppState::new(Arc::new(gateway), cache);

    sync::fetch_pages(&state, &config.tenant).await;
    let snapshot = state.snapshot().await;
    tracing::info!(tenant = %snapshot.tenant, pages = snapshot.pages.len(), "pagegrid ready");

    let sync_task = sync::spawn_sync_task(state.clone(), config.sync_initial_delay, config.sync_interval);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    sync_task.abort();
    if state.cache.flush() {
        tracing::info!("pending cache write flushed");
    }
    tracing::info!("pagegrid stopped");
}
