// Shared HTTP client construction.

use reqwest::Client;

/// A reqwest client with the aws-lc-rs TLS provider installed.
///
/// reqwest is built without a bundled provider, so the first client installs
/// one process-wide; later calls find it already set.
pub(crate) fn http_client() -> Client {
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    Client::new()
}
