use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::TlsConfig;

/// Build the acceptor config for the API listener.
///
/// The certificate chain is `cert` followed by everything in `ca`.
pub async fn load_rustls_config(tls: &TlsConfig) -> io::Result<RustlsConfig> {
    // Fails only when a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let mut chain = read_pem(&tls.cert).await?;
    if !chain.ends_with(b"\n") {
        chain.push(b'\n');
    }
    chain.extend(read_pem(&tls.ca).await?);
    let key = read_pem(&tls.key).await?;

    RustlsConfig::from_pem(chain, key).await
}

async fn read_pem(path: &Path) -> io::Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| io::Error::new(e.kind(), format!("{}: {e}", path.display())))
}
