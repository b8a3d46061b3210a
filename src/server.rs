//! Service runtime
//!
//! [`ServerHandle`] owns the full lifecycle: metrics recorder, storage
//! (SQLite/PostgreSQL through SeaORM, or the in-memory store), the expiry
//! sweeper, the REST API and graceful shutdown.

use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::events::{create_event_bus, SharedEventBus};
use crate::application::parking::ParkingServices;
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::{init_and_migrate, init_database, SeaOrmRepositoryProvider};
use crate::infrastructure::storage::InMemoryRepositoryProvider;
use crate::interfaces::http::create_api_router;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::time::SystemClock;

// ── Options ────────────────────────────────────────────────────────

pub struct ServerOptions {
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running parking service.
///
/// ```rust,no_run
/// use mall_parking::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.install_signal_handler();
///     handle.wait().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub event_bus: SharedEventBus,
    pub repos: Arc<dyn RepositoryProvider>,
    pub services: ParkingServices,
    pub config: AppConfig,
    /// Port the REST API is bound to.
    pub port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: JoinHandle<()>,
    sweeper_task: Option<JoinHandle<()>>,
}

/// The global recorder can only be installed once per process; later starts
/// reuse it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();
    PROM_HANDLE
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
                None
            }
        })
        .clone()
}

impl ServerHandle {
    /// 1. Install the Prometheus recorder
    /// 2. Open storage (and migrate, unless disabled)
    /// 3. Wire the parking services
    /// 4. Start the expiry sweeper
    /// 5. Bind and serve the REST API
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting mall parking service...");

        let metrics = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            if app_cfg.uses_memory_store() {
                warn!("Using the in-memory store; all data is lost on exit");
                (Arc::new(InMemoryRepositoryProvider::new()), None)
            } else {
                let db_config = app_cfg.database_config();
                let db = if opts.auto_migrate {
                    init_and_migrate(&db_config).await?
                } else {
                    init_database(&db_config).await?
                };
                (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
            };

        // ── Services ───────────────────────────────────────────
        let event_bus = create_event_bus();
        let policy = app_cfg.hold_policy();
        info!(
            default_minutes = policy.default_minutes,
            min_minutes = policy.min_minutes,
            max_minutes = policy.max_minutes,
            "Hold policy configured"
        );
        let services = ParkingServices::new(
            repos.clone(),
            Arc::new(SystemClock),
            event_bus.clone(),
            policy,
        );

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        // ── Background tasks ───────────────────────────────────
        let sweeper_task = if app_cfg.sweeper.enabled {
            Some(
                services
                    .sweeper
                    .clone()
                    .start(app_cfg.sweeper_config(), shutdown_signal.clone()),
            )
        } else {
            warn!("Expiry sweeper disabled; expired holds are only released via the sweep endpoint");
            None
        };

        // ── REST API server ────────────────────────────────────
        let api_router = create_api_router(services.clone(), db.clone(), metrics);

        let addr = app_cfg.listen_address();
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();
        info!("REST API server listening on http://{}", addr);
        info!("Swagger UI available at http://{}/docs/", addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            event_bus,
            repos,
            services,
            config: app_cfg,
            port,
            db,
            shutdown,
            api_task,
            sweeper_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait until the API server stops, then give the sweeper up to the
    /// configured grace period and close the database.
    pub async fn wait(self) {
        match self.api_task.await {
            Ok(()) => info!("REST API server stopped"),
            Err(e) => error!("REST API server task panicked: {}", e),
        }

        // The server can also stop on its own; make sure the sweeper follows.
        self.shutdown.signal().trigger();

        if let Some(task) = self.sweeper_task {
            match tokio::time::timeout(self.shutdown.timeout(), task).await {
                Ok(Ok(())) => info!("Expiry sweeper stopped"),
                Ok(Err(e)) => error!("Expiry sweeper task panicked: {}", e),
                Err(_) => warn!("Expiry sweeper did not stop within the shutdown timeout"),
            }
        }

        if let Some(db) = self.db {
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("Database connection closed");
            }
        }

        info!("Mall parking service shutdown complete");
    }

    pub async fn shutdown(self) {
        info!("Shutting down mall parking service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the logging section. `RUST_LOG` wins over
/// `logging.level`.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_server_starts_and_stops() {
        let mut config = AppConfig::default();
        config.server.host = "127.0.0.1".into();
        config.server.port = 0;
        config.database.url = "memory".into();

        let handle = ServerHandle::start(ServerOptions {
            config,
            auto_migrate: true,
        })
        .await
        .unwrap();
        assert!(handle.port > 0);
        assert!(handle.is_running());

        tokio::time::timeout(std::time::Duration::from_secs(5), handle.shutdown())
            .await
            .unwrap();
    }
}
