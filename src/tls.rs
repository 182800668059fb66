//! TLS activation for the serve path.
//!
//! Two mutually exclusive modes: a self-signed certificate on a fixed local
//! port for development, and certificates provisioned into the certificate
//! directory for production. Each mode hands back a future that the
//! bootstrapper spawns and never joins.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use futures_util::future::BoxFuture;
use thiserror::Error;

/// Which certificate strategy is active for a serve run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    None,
    Dev,
    Production,
}

impl TlsMode {
    /// `devhttps` takes precedence over `https`.
    pub fn resolve(dev_https: bool, https: bool) -> Self {
        if dev_https {
            TlsMode::Dev
        } else if https {
            TlsMode::Production
        } else {
            TlsMode::None
        }
    }
}

#[derive(Error, Debug)]
pub enum TlsError {
    #[error("failed to generate self-signed certificate: {0}")]
    SelfSigned(#[from] rcgen::Error),

    #[error("certificate not found at {0}")]
    CertificateMissing(PathBuf),

    #[error("failed to load certificate: {0}")]
    Load(#[source] std::io::Error),

    #[error("certificate file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTPS listener on {addr} failed: {source}")]
    Serve {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// A detached HTTPS task
pub type TlsTask = BoxFuture<'static, Result<(), TlsError>>;

/// Trait abstracting TLS activation for testability
pub trait TlsManager: Send + Sync {
    /// Port used by [`TlsManager::enable_dev`]
    fn dev_port(&self) -> u16;

    /// Serve `app` over self-signed HTTPS on the dev port
    fn enable_dev(&self, app: Router) -> TlsTask;

    /// Serve `app` over HTTPS on `https_port` with the provisioned certificate
    fn enable(&self, app: Router, https_port: u16) -> TlsTask;
}

/// Rustls-backed implementation serving through `axum-server`
pub struct RustlsManager {
    cert_dir: PathBuf,
    dev_port: u16,
}

impl RustlsManager {
    pub fn new(cert_dir: PathBuf, dev_port: u16) -> Self {
        Self { cert_dir, dev_port }
    }
}

impl TlsManager for RustlsManager {
    fn dev_port(&self) -> u16 {
        self.dev_port
    }

    fn enable_dev(&self, app: Router) -> TlsTask {
        let dir = self.cert_dir.join("dev");
        let addr = SocketAddr::from(([127, 0, 0, 1], self.dev_port));

        Box::pin(async move {
            let (cert, key) = ensure_self_signed(&dir)?;
            serve_tls(app, addr, &cert, &key).await
        })
    }

    fn enable(&self, app: Router, https_port: u16) -> TlsTask {
        let cert = self.cert_dir.join("cert.pem");
        let key = self.cert_dir.join("key.pem");
        let addr = SocketAddr::from(([0, 0, 0, 0], https_port));

        Box::pin(async move {
            for path in [&cert, &key] {
                if !path.exists() {
                    return Err(TlsError::CertificateMissing(path.clone()));
                }
            }
            serve_tls(app, addr, &cert, &key).await
        })
    }
}

/// Return the dev certificate and key under `dir`, generating them on first use.
pub fn ensure_self_signed(dir: &Path) -> Result<(PathBuf, PathBuf), TlsError> {
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");

    if cert_path.exists() && key_path.exists() {
        return Ok((cert_path, key_path));
    }

    std::fs::create_dir_all(dir)?;

    let rcgen::CertifiedKey { cert, key_pair } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])?;
    std::fs::write(&cert_path, cert.pem())?;
    std::fs::write(&key_path, key_pair.serialize_pem())?;

    tracing::info!(path = %cert_path.display(), "Generated self-signed development certificate");

    Ok((cert_path, key_path))
}

async fn serve_tls(
    app: Router,
    addr: SocketAddr,
    cert: &Path,
    key: &Path,
) -> Result<(), TlsError> {
    let config = RustlsConfig::from_pem_file(cert, key)
        .await
        .map_err(TlsError::Load)?;

    tracing::info!("HTTPS listening on https://{}", addr);

    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service())
        .await
        .map_err(|source| TlsError::Serve { addr, source })
}
