//! Outbound HTTP client construction shared by the metrics backend and the sinks.

use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Install the process-wide rustls crypto provider if nothing has installed one yet.
///
/// reqwest is built without a bundled provider, so every client constructor goes through here.
pub fn ensure_crypto_provider() {
    // Err means a provider is already installed, which is what we want.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Build a client whose every request is bounded by `timeout`
pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    ensure_crypto_provider();
    Ok(Client::builder().timeout(timeout).build()?)
}

/// Makes sure a url has a trailing slash.
///
/// `Url::join` replaces the last path segment unless the base ends in '/', so
/// `http://host/prom` joined with `api/v1/query` would otherwise lose `prom`.
pub fn ensure_slash(url: &Url) -> Url {
    if url.path().ends_with('/') {
        url.clone()
    } else {
        let mut new_url = url.clone();
        let mut path = new_url.path().to_string();
        path.push('/');
        new_url.set_path(&path);
        new_url
    }
}
