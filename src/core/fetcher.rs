use crate::domain::model::{FetchRequest, FetchResult, Payload, ResponseKind};
use crate::domain::ports::{Transport, TransportResponse};
use std::sync::Arc;

/// Status codes that count as a successful load.
const SUCCESS_STATUSES: [u16; 3] = [200, 206, 304];

/// Runs one download through a [`Transport`] and turns the raw response into
/// a [`FetchResult`]. Never retries.
#[derive(Clone)]
pub struct ResourceFetcher {
    transport: Arc<dyn Transport>,
}

impl ResourceFetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `on_progress` sees non-decreasing cumulative byte counts; `on_done`
    /// fires exactly once.
    pub async fn fetch<P, D>(&self, request: FetchRequest, mut on_progress: P, on_done: D)
    where
        P: FnMut(u64) + Send,
        D: FnOnce(FetchResult),
    {
        let mut reported = 0u64;
        let mut forward = |loaded: u64| {
            if loaded > reported {
                reported = loaded;
                on_progress(loaded);
            }
        };

        let outcome = self.transport.get(request.url(), &mut forward).await;
        let result = match outcome {
            Ok(response) => {
                let result = interpret(&request, response);
                if let FetchResult::Success(payload) = &result {
                    // Top up transports that under-report.
                    forward(payload.len() as u64);
                }
                result
            }
            Err(e) => {
                tracing::warn!("Transport error for {}: {}", request.url(), e);
                FetchResult::Failure(e.to_string())
            }
        };

        on_done(result);
    }
}

fn interpret(request: &FetchRequest, response: TransportResponse) -> FetchResult {
    let accepted = match response.status {
        Some(code) => SUCCESS_STATUSES.contains(&code),
        None => !response.body.is_empty(),
    };

    if !accepted {
        tracing::warn!(
            "Rejected response for {}: status={:?} ({})",
            request.url(),
            response.status,
            response.status_text
        );
        let status_text = if response.status_text.trim().is_empty() {
            match response.status {
                Some(code) => format!("HTTP {}", code),
                None => "empty response".to_string(),
            }
        } else {
            response.status_text
        };
        return FetchResult::Failure(status_text);
    }

    tracing::debug!(
        "Fetched {} ({} bytes, status={:?})",
        request.url(),
        response.body.len(),
        response.status
    );

    match request.response_kind() {
        ResponseKind::Text => match String::from_utf8(response.body.to_vec()) {
            Ok(text) => FetchResult::Success(Payload::Text(text)),
            Err(e) => FetchResult::Failure(format!("malformed response: {}", e)),
        },
        ResponseKind::Blob => FetchResult::Success(Payload::Blob(response.body)),
        ResponseKind::Buffer => FetchResult::Success(Payload::Buffer(response.body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::TransportError;
    use async_trait::async_trait;
    use bytes::Bytes;

    struct CannedTransport {
        status: Option<u16>,
        status_text: &'static str,
        body: &'static [u8],
        steps: Vec<u64>,
    }

    impl CannedTransport {
        fn ok(body: &'static [u8]) -> Self {
            Self {
                status: Some(200),
                status_text: "200 OK",
                body,
                steps: vec![],
            }
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn get(
            &self,
            _url: &str,
            on_progress: &mut (dyn FnMut(u64) + Send),
        ) -> Result<TransportResponse, TransportError> {
            for step in &self.steps {
                on_progress(*step);
            }
            Ok(TransportResponse {
                status: self.status,
                status_text: self.status_text.to_string(),
                body: Bytes::from_static(self.body),
            })
        }
    }

    struct BrokenTransport;

    #[async_trait]
    impl Transport for BrokenTransport {
        async fn get(
            &self,
            _url: &str,
            _on_progress: &mut (dyn FnMut(u64) + Send),
        ) -> Result<TransportResponse, TransportError> {
            Err(TransportError::Network("connection refused".to_string()))
        }
    }

    async fn run(transport: impl Transport + 'static, kind: ResponseKind) -> (Vec<u64>, Vec<FetchResult>) {
        let fetcher = ResourceFetcher::new(Arc::new(transport));
        let mut progress = Vec::new();
        let mut results = Vec::new();
        fetcher
            .fetch(
                FetchRequest::new("http://test.local/res", kind),
                |loaded| progress.push(loaded),
                |result| results.push(result),
            )
            .await;
        (progress, results)
    }

    #[tokio::test]
    async fn test_text_success() {
        let (progress, results) = run(CannedTransport::ok(b"var deus;"), ResponseKind::Text).await;
        assert_eq!(results, vec![FetchResult::Success(Payload::Text("var deus;".to_string()))]);
        assert_eq!(progress, vec![9]);
    }

    #[tokio::test]
    async fn test_partial_and_not_modified_are_success() {
        for code in [206u16, 304] {
            let transport = CannedTransport {
                status: Some(code),
                ..CannedTransport::ok(b"abc")
            };
            let (_, results) = run(transport, ResponseKind::Buffer).await;
            assert_eq!(
                results,
                vec![FetchResult::Success(Payload::Buffer(Bytes::from_static(b"abc")))]
            );
        }
    }

    #[tokio::test]
    async fn test_statusless_body_is_success() {
        let transport = CannedTransport {
            status: None,
            status_text: "",
            ..CannedTransport::ok(b"blob")
        };
        let (_, results) = run(transport, ResponseKind::Blob).await;
        assert_eq!(
            results,
            vec![FetchResult::Success(Payload::Blob(Bytes::from_static(b"blob")))]
        );
    }

    #[tokio::test]
    async fn test_statusless_empty_body_is_failure() {
        let transport = CannedTransport {
            status: None,
            status_text: "",
            ..CannedTransport::ok(b"")
        };
        let (_, results) = run(transport, ResponseKind::Blob).await;
        assert_eq!(results, vec![FetchResult::Failure("empty response".to_string())]);
    }

    #[tokio::test]
    async fn test_not_found_is_failure_with_status_text() {
        let transport = CannedTransport {
            status: Some(404),
            status_text: "404 Not Found",
            ..CannedTransport::ok(b"missing")
        };
        let (progress, results) = run(transport, ResponseKind::Blob).await;
        assert_eq!(results, vec![FetchResult::Failure("404 Not Found".to_string())]);
        assert!(progress.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8_text_is_failure() {
        let (_, results) = run(CannedTransport::ok(&[0xff, 0xfe, 0x00]), ResponseKind::Text).await;
        match &results[..] {
            [FetchResult::Failure(message)] => assert!(message.starts_with("malformed response")),
            other => panic!("unexpected results: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failure() {
        let (_, results) = run(BrokenTransport, ResponseKind::Text).await;
        assert_eq!(
            results,
            vec![FetchResult::Failure("network error: connection refused".to_string())]
        );
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let transport = CannedTransport {
            steps: vec![2, 1, 4, 4, 3],
            ..CannedTransport::ok(b"123456")
        };
        let (progress, _) = run(transport, ResponseKind::Buffer).await;
        assert_eq!(progress, vec![2, 4, 6]);
    }
}
