use crate::domain::ports::{Transport, TransportError, TransportResponse};
use crate::utils::error::Result;
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// [`Transport`] over reqwest, with `file://` locations read from disk.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    async fn get_remote(
        &self,
        url: &str,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> std::result::Result<TransportResponse, TransportError> {
        tracing::debug!("GET {}", url);
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let status_text = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?
        {
            body.extend_from_slice(&chunk);
            on_progress(body.len() as u64);
        }

        Ok(TransportResponse {
            status: Some(status.as_u16()),
            status_text,
            body: body.freeze(),
        })
    }

    async fn get_local(
        &self,
        url: &Url,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> std::result::Result<TransportResponse, TransportError> {
        let path = url
            .to_file_path()
            .map_err(|_| TransportError::Unsupported(url.to_string()))?;
        tracing::debug!("Reading local resource {}", path.display());
        let data = tokio::fs::read(&path).await?;
        on_progress(data.len() as u64);
        Ok(TransportResponse {
            status: None,
            status_text: String::new(),
            body: Bytes::from(data),
        })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        on_progress: &mut (dyn FnMut(u64) + Send),
    ) -> std::result::Result<TransportResponse, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::Unsupported(e.to_string()))?;
        match parsed.scheme() {
            "http" | "https" => self.get_remote(url, on_progress).await,
            "file" => self.get_local(&parsed, on_progress).await,
            scheme => Err(TransportError::Unsupported(format!("{} ({})", url, scheme))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_remote_body_and_progress() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/deus.wasm");
            then.status(200).body(vec![7u8; 4096]);
        });

        let transport = HttpTransport::new();
        let mut seen = Vec::new();
        let response = transport
            .get(&server.url("/deus.wasm"), &mut |loaded: u64| seen.push(loaded))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(response.status, Some(200));
        assert_eq!(response.status_text, "200 OK");
        assert_eq!(response.body.len(), 4096);
        assert_eq!(seen.last(), Some(&4096));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_remote_error_status_is_not_transport_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing");
            then.status(404);
        });

        let transport = HttpTransport::new();
        let response = transport
            .get(&server.url("/missing"), &mut |_: u64| {})
            .await
            .unwrap();
        assert_eq!(response.status, Some(404));
        assert_eq!(response.status_text, "404 Not Found");
    }

    #[tokio::test]
    async fn test_local_file_has_no_status() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"local data").unwrap();
        let url = Url::from_file_path(file.path()).unwrap();

        let transport = HttpTransport::new();
        let response = transport.get(url.as_str(), &mut |_: u64| {}).await.unwrap();
        assert_eq!(response.status, None);
        assert_eq!(&response.body[..], b"local data");
    }

    #[tokio::test]
    async fn test_unsupported_scheme() {
        let transport = HttpTransport::new();
        let result = transport.get("ftp://host/file", &mut |_: u64| {}).await;
        assert!(matches!(result, Err(TransportError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let transport = HttpTransport::new();
        let result = transport.get("http://127.0.0.1:1/deus.js", &mut |_: u64| {}).await;
        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
