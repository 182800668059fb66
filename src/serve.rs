//! In-process bootstrap for `ponzu serve`.
//!
//! The sequence is strictly ordered:
//!
//! 1. open the config store
//! 2. open analytics
//! 3. register the requested services into the router
//! 4. persist `https_port`
//! 5. launch the TLS task for the resolved mode (not awaited)
//! 6. persist `http_port`
//! 7. bind and serve HTTP
//!
//! Every failure is returned rather than exiting in place, so the store and
//! analytics guards close both subsystems before the process terminates.

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::analytics::{Analytics, SessionAnalytics};
use crate::cli::Invocation;
use crate::config::Config;
use crate::lifecycle;
use crate::services::{
    AdminService, ApiService, Service, ServiceRegistrar, ServiceSet, ServiceState, UnknownService,
};
use crate::store::{ConfigStore, FileConfigStore, HTTPS_PORT, HTTP_PORT};
use crate::tls::{RustlsManager, TlsManager, TlsMode, TlsTask};

/// What a fatal serve error was caused by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatalKind {
    /// Config store or analytics failed to initialize
    Startup,
    /// A config write (or its read-back) failed
    ConfigWrite,
    /// The HTTP listener could not bind or stopped
    Listen,
}

impl fmt::Display for FatalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalKind::Startup => write!(f, "startup"),
            FatalKind::ConfigWrite => write!(f, "config-write"),
            FatalKind::Listen => write!(f, "listen"),
        }
    }
}

/// Unrecoverable serve failure; the process terminates after logging it
#[derive(Error, Debug)]
#[error("{message}: {source}")]
pub struct FatalError {
    pub kind: FatalKind,
    message: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl FatalError {
    pub fn new(
        kind: FatalKind,
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: source.into(),
        }
    }

    fn config_write(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::new(
            FatalKind::ConfigWrite,
            "System failed to save config. Please try to run again.",
            source,
        )
    }
}

#[derive(Error, Debug)]
pub enum ServeError {
    #[error(transparent)]
    UnknownService(#[from] UnknownService),

    #[error(transparent)]
    Fatal(#[from] FatalError),
}

/// Inputs of one serve run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeArgs {
    pub port: u16,
    pub https_port: u16,
    pub tls: TlsMode,
    /// Comma-joined service list; `None` activates nothing
    pub services: Option<String>,
}

impl From<&Invocation> for ServeArgs {
    fn from(invocation: &Invocation) -> Self {
        Self {
            port: invocation.flags.port,
            https_port: invocation.flags.https_port,
            tls: invocation.flags.tls_mode(),
            services: invocation.first_arg().map(str::to_string),
        }
    }
}

pub struct Bootstrapper {
    store: Arc<dyn ConfigStore>,
    analytics: Arc<dyn Analytics>,
    tls: Arc<dyn TlsManager>,
    api: Box<dyn ServiceRegistrar>,
    admin: Box<dyn ServiceRegistrar>,
}

impl Bootstrapper {
    pub fn new(
        store: Arc<dyn ConfigStore>,
        analytics: Arc<dyn Analytics>,
        tls: Arc<dyn TlsManager>,
        api: Box<dyn ServiceRegistrar>,
        admin: Box<dyn ServiceRegistrar>,
    ) -> Self {
        Self {
            store,
            analytics,
            tls,
            api,
            admin,
        }
    }

    /// Production collaborators rooted in the configured data directory
    pub fn from_config(config: &Config) -> Self {
        let store: Arc<dyn ConfigStore> = Arc::new(FileConfigStore::new(config.store_path()));
        let state = ServiceState::new(store.clone(), config.content_path());

        Self::new(
            store,
            Arc::new(SessionAnalytics::new(config.analytics_path())),
            Arc::new(RustlsManager::new(config.cert_path(), config.tls.dev_port)),
            Box::new(ApiService::new(state.clone())),
            Box::new(AdminService::new(state)),
        )
    }

    fn registrar(&self, service: Service) -> &dyn ServiceRegistrar {
        match service {
            Service::Api => self.api.as_ref(),
            Service::Admin => self.admin.as_ref(),
        }
    }

    /// Run the bootstrap sequence. Only returns on failure.
    pub async fn serve(self, args: ServeArgs) -> Result<Infallible, ServeError> {
        let store = lifecycle::open(self.store.clone()).map_err(|e| {
            FatalError::new(FatalKind::Startup, "Failed to initialize config store", e)
        })?;
        let _analytics = lifecycle::open(self.analytics.clone())
            .map_err(|e| FatalError::new(FatalKind::Startup, "Failed to initialize analytics", e))?;

        let mut router = Router::new();
        if let Some(list) = args.services.as_deref() {
            let services = ServiceSet::parse(list).map_err(|e| {
                println!("To execute 'ponzu serve', you must specify which service to run.");
                println!("$ ponzu --help");
                e
            })?;
            tracing::info!(services = list, "Configured to start services");

            for service in services.iter() {
                router = self.registrar(service).register(router);
                tracing::info!(service = %service, "Registered service");
            }
        }
        let router = router.layer(TraceLayer::new_for_http());

        store
            .get()
            .put_config(HTTPS_PORT, &args.https_port.to_string())
            .map_err(FatalError::config_write)?;
        tracing::info!(key = HTTPS_PORT, value = args.https_port, "Persisted config");

        match args.tls {
            TlsMode::Dev => {
                println!("Enabling self-signed HTTPS... [DEV]");
                spawn_tls(TlsMode::Dev, self.tls.enable_dev(router.clone()));
                println!(
                    "Server listening on https://localhost:{} for requests... [DEV]",
                    self.tls.dev_port()
                );
                println!("----");
                println!("If your browser rejects HTTPS requests, try allowing insecure connections on localhost.");
                println!("on Chrome, visit chrome://flags/#allow-insecure-localhost");
            }
            TlsMode::Production => {
                println!("Enabling HTTPS...");
                let https_port = store
                    .get()
                    .config_cache(HTTPS_PORT)
                    .ok_or_else(|| FatalError::config_write("https_port missing from config cache"))?;
                let port: u16 = https_port.parse().map_err(FatalError::config_write)?;

                spawn_tls(TlsMode::Production, self.tls.enable(router.clone(), port));
                println!("Server listening on :{} for HTTPS requests...", https_port);
            }
            TlsMode::None => {}
        }

        store
            .get()
            .put_config(HTTP_PORT, &args.port.to_string())
            .map_err(FatalError::config_write)?;
        tracing::info!(key = HTTP_PORT, value = args.port, "Persisted config");

        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
            FatalError::new(FatalKind::Listen, format!("Failed to bind {}", addr), e)
        })?;

        tracing::info!("HTTP listening on http://{}", addr);

        axum::serve(listener, router)
            .await
            .map_err(|e| FatalError::new(FatalKind::Listen, "HTTP listener failed", e))?;

        Err(FatalError::new(FatalKind::Listen, "HTTP listener stopped", "server exited").into())
    }
}

/// Detach a TLS task; its failure is only logged.
fn spawn_tls(mode: TlsMode, task: TlsTask) {
    tracing::info!(?mode, "Launching TLS task");
    tokio::spawn(async move {
        if let Err(e) = task.await {
            tracing::error!(?mode, "TLS task failed: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Flags;

    #[test]
    fn test_serve_args_from_invocation() {
        let flags = Flags {
            port: 9000,
            https: true,
            ..Flags::default()
        };
        let invocation = Invocation::new(flags, &["serve".to_string(), "api".to_string()]);
        let args = ServeArgs::from(&invocation);

        assert_eq!(args.port, 9000);
        assert_eq!(args.https_port, 443);
        assert_eq!(args.tls, TlsMode::Production);
        assert_eq!(args.services.as_deref(), Some("api"));
    }

    #[test]
    fn test_serve_args_without_services() {
        let invocation = Invocation::new(Flags::default(), &["s".to_string()]);
        let args = ServeArgs::from(&invocation);
        assert_eq!(args.services, None);
        assert_eq!(args.tls, TlsMode::None);
    }

    #[test]
    fn test_fatal_error_display_and_kind() {
        let err = FatalError::config_write("disk full");
        assert_eq!(err.kind, FatalKind::ConfigWrite);
        assert_eq!(
            err.to_string(),
            "System failed to save config. Please try to run again.: disk full"
        );
        assert_eq!(FatalKind::Listen.to_string(), "listen");
        assert_eq!(FatalKind::Startup.to_string(), "startup");
    }
}
