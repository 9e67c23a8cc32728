//! Websocket connection setup for the realtime feed.

use rustls::RootCertStore;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};

use crate::error::{ChatError, Result};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Create a TLS connector with webpki root certificates for cross-platform compatibility
pub fn create_tls_connector() -> Result<Connector> {
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ChatError::Tls(e.to_string()))?
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Connector::Rustls(Arc::new(config)))
}

/// Open a websocket to `url`, using TLS for `wss://` URLs.
pub async fn connect_websocket(url: &str) -> Result<WsStream> {
    let connector = if url.starts_with("wss://") {
        Some(create_tls_connector()?)
    } else {
        None
    };

    let (stream, response) = connect_async_tls_with_config(url, None, false, connector).await?;
    // The URL carries the API key, so only the status is logged
    tracing::debug!(status = %response.status(), "realtime websocket connected");
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_connector_builds() {
        assert!(matches!(create_tls_connector(), Ok(Connector::Rustls(_))));
    }
}
