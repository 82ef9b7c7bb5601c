//! Server lifecycle: open store, bind, serve, shut down, close store.

use crate::{build_router, AppState};
use log::{info, warn};
use std::future::Future;
use taskboard_core::{AppEnvironment, DbError, ServerConfig, TaskStore};
use thiserror::Error;
use tokio::net::TcpListener;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to open task store: {0}")]
    Store(#[from] DbError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opens the store from `config` and serves until Ctrl-C or SIGTERM.
pub async fn run(config: &ServerConfig) -> Result<(), ServeError> {
    let store = TaskStore::open(config.db_source(), config.pool)?;
    let addr = config.bind_addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(source) => {
            store.close();
            return Err(ServeError::Bind { addr, source });
        }
    };

    serve(listener, store, config.environment, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
///
/// The store is closed once in-flight requests have drained, whether
/// serving ended cleanly or not.
pub async fn serve<F>(
    listener: TcpListener,
    store: TaskStore,
    environment: AppEnvironment,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let local_addr = listener.local_addr()?;
    info!(
        "event=server_start module=api status=ok addr={} env={}",
        local_addr,
        environment.as_str()
    );

    let app = build_router(AppState::new(store.clone(), environment));
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await;

    store.close();
    match &result {
        Ok(()) => info!("event=server_stop module=api status=ok addr={local_addr}"),
        Err(err) => warn!("event=server_stop module=api status=error error={err}"),
    }
    result.map_err(ServeError::from)
}

/// Resolves on Ctrl-C, or on SIGTERM where supported.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("event=shutdown_signal module=api status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("event=shutdown_signal module=api status=ok signal=ctrl_c"),
        _ = wait_for_sigterm() => info!("event=shutdown_signal module=api status=ok signal=sigterm"),
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(err) => {
            warn!("event=shutdown_signal module=api status=error signal=sigterm error={err}");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
