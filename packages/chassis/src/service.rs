//! Service instance lifecycle.
//!
//! Implements the deferred startup pattern: `new()` generates identity and
//! holds the resolved configuration, `init_db()` attaches the pooled store
//! handle, `init_router()` builds the routing surface, `bind()` binds the
//! TCP listener, and `serve()` starts accepting connections. The routing
//! surface is mutable only before serving: `serve()` consumes the
//! instance, so registering a route on a serving instance is
//! unrepresentable rather than merely discouraged.

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, MethodRouter};
use axum::Router;
use sqlx::postgres::PgPool;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::ServiceConfig;
use crate::db;
use crate::error::{ChassisError, Result};
use crate::identity::{hostname, ServiceIdentity};
use crate::network::handlers::{health_ping_handler, AppState};
use crate::network::{build_http_layers, TlsConfig};

/// One running service process: identity, configuration, pooled store
/// handle, and routing surface.
///
/// Lifecycle: constructed once at startup, mutated only during the
/// single-threaded initialization phase, torn down at process exit (the
/// pool closes with the process).
pub struct Service {
    identity: ServiceIdentity,
    config: Arc<ServiceConfig>,
    db: Option<PgPool>,
    router: Option<Router<AppState>>,
    listener: Option<TcpListener>,
    routes: Vec<String>,
}

impl Service {
    /// Creates the bare service instance.
    ///
    /// Identity is generated here, exactly once; it is never regenerated.
    /// No store or routes are attached yet.
    #[must_use]
    pub fn new(config: ServiceConfig) -> Self {
        let identity = ServiceIdentity::generate();
        info!(
            "starting {} instance {} ({})",
            identity.executable, identity.instance_name, identity.instance_id
        );
        Self {
            identity,
            config: Arc::new(config),
            db: None,
            router: None,
            listener: None,
            routes: Vec::new(),
        }
    }

    /// Replaces the version string reported by the health endpoint.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.identity = self.identity.with_version(version);
        self
    }

    /// Returns the generated identity of this instance.
    #[must_use]
    pub fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    /// Returns the resolved configuration snapshot.
    #[must_use]
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the pooled store handle once attached.
    #[must_use]
    pub fn db(&self) -> Option<&PgPool> {
        self.db.as_ref()
    }

    /// Opens the pooled store handle from the configuration and attaches it.
    ///
    /// # Errors
    ///
    /// Propagates pool creation and liveness-probe failures; the caller
    /// must abort startup rather than proceed to serve.
    pub async fn init_db(&mut self) -> Result<()> {
        let pool = db::pool::connect(&self.config.database).await?;
        self.attach_pool(pool);
        Ok(())
    }

    /// Attaches an externally created pool.
    ///
    /// For embedding services that manage their own pool; `init_db` is the
    /// usual path.
    pub fn attach_pool(&mut self, pool: PgPool) {
        self.db = Some(pool);
    }

    /// Builds the routing surface and registers the mandatory health route.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when no pool is attached yet; the
    /// lifecycle requires the store before routes.
    pub fn init_router(&mut self) -> Result<()> {
        if self.db.is_none() {
            return Err(ChassisError::config(
                "init_router requires an initialized connection pool; call init_db first",
            ));
        }
        self.router = Some(Router::new().route("/health/ping", get(health_ping_handler)));
        self.routes.push("GET /health/ping".to_string());
        Ok(())
    }

    /// Registers an additional route. Only possible before serving.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the routing surface has not been
    /// built yet.
    pub fn register_route(&mut self, path: &str, route: MethodRouter<AppState>) -> Result<()> {
        let router = self.router.take().ok_or_else(|| {
            ChassisError::config(
                "register_route requires a routing surface; call init_router first",
            )
        })?;
        self.router = Some(router.route(path, route));
        self.routes.push(path.to_string());
        Ok(())
    }

    /// Convenience initialization: pool, then routing surface.
    ///
    /// # Errors
    ///
    /// Propagates the first failing step.
    pub async fn initialize(&mut self) -> Result<()> {
        self.init_db().await?;
        self.init_router()
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the actual bound port, which may differ from the configured
    /// port when port 0 is used (OS-assigned ephemeral port).
    ///
    /// # Errors
    ///
    /// Returns a bind error if the address cannot be bound (e.g., port in
    /// use); fatal at this point in the lifecycle.
    pub async fn bind(&mut self) -> Result<u16> {
        let listener = self.bind_listener().await?;
        let port = listener
            .local_addr()
            .map_err(|e| ChassisError::Serve { source: e })?
            .port();
        info!("TCP listener bound to {}:{port}", self.config.network.host);
        self.listener = Some(listener);
        Ok(port)
    }

    async fn bind_listener(&self) -> Result<TcpListener> {
        let addr = self.config.network.listen_addr();
        TcpListener::bind(&addr)
            .await
            .map_err(|e| ChassisError::Bind { addr, source: e })
    }

    /// Starts serving until `shutdown` resolves or a fatal error occurs.
    ///
    /// Consumes the instance: this is the terminal lifecycle operation,
    /// and no further routes can be registered. Binds the listener if
    /// `bind()` was not called. Serves TLS when certificate material is
    /// configured, plain HTTP otherwise.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the pool or routing surface is
    /// missing, a bind error when the listener cannot be bound, and a
    /// serve error on fatal I/O.
    pub async fn serve(
        mut self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> Result<()> {
        let db = self.db.take().ok_or_else(|| {
            ChassisError::config(
                "serve requires an initialized connection pool; call init_db first",
            )
        })?;
        let router = self.router.take().ok_or_else(|| {
            ChassisError::config("serve requires a routing surface; call init_router first")
        })?;
        let tls = self.config.network.tls_config()?;

        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => self.bind_listener().await?,
        };
        let addr = listener
            .local_addr()
            .map_err(|e| ChassisError::Serve { source: e })?;

        let identity = Arc::new(self.identity);
        let state = AppState {
            identity: Arc::clone(&identity),
            db,
            config: Arc::clone(&self.config),
            hostname: hostname(),
        };
        let app = router
            .layer(build_http_layers(&self.config.network))
            .with_state(state);

        let scheme = if tls.is_some() { "https" } else { "http" };
        info!("{} is available at {scheme}://{addr}", identity.executable);
        debug!("registered routes:");
        for path in &self.routes {
            debug!("  {path}");
        }

        match tls {
            Some(ref tls) => serve_tls(listener, app, tls, shutdown).await,
            None => serve_plain(listener, app, shutdown).await,
        }
    }
}

/// Serves plain HTTP connections using axum's built-in server.
async fn serve_plain(
    listener: TcpListener,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| ChassisError::Serve { source: e })
}

/// Serves TLS connections using `axum-server` with rustls.
///
/// Reuses the pre-bound TCP listener by converting it to a
/// `std::net::TcpListener`.
async fn serve_tls(
    listener: TcpListener,
    app: Router,
    tls: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .map_err(|e| ChassisError::Tls { source: e })?;

    let std_listener = listener
        .into_std()
        .map_err(|e| ChassisError::Serve { source: e })?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    // Bridge the shutdown future onto the axum-server handle.
    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(app.into_make_service())
        .await
        .map_err(|e| ChassisError::Serve { source: e })
}
