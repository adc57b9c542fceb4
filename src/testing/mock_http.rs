//! Local HTTP endpoint for tests, backed by wiremock.
//!
//! The code under test uses blocking reqwest, so the fixture owns its own
//! tokio runtime and only enters it to drive the mock server's async API.

use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::runtime::Runtime;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Mock server answering every GET through a responder that receives the
/// zero-based request index.
pub struct MockHttp {
    server: MockServer,
    runtime: Runtime,
}

impl MockHttp {
    pub fn start<F>(respond: F) -> Self
    where
        F: Fn(usize) -> ResponseTemplate + Send + Sync + 'static,
    {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .expect("build mock server runtime");
        let server = runtime.block_on(MockServer::start());

        let requests = AtomicUsize::new(0);
        runtime.block_on(
            Mock::given(method("GET"))
                .respond_with(move |_: &Request| {
                    respond(requests.fetch_add(1, Ordering::SeqCst))
                })
                .mount(&server),
        );

        Self { server, runtime }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.server.uri(), path)
    }

    /// Number of requests the server has received so far.
    pub fn hits(&self) -> usize {
        self.runtime
            .block_on(self.server.received_requests())
            .map_or(0, |requests| requests.len())
    }
}

/// Node status document in the shape the status probe reads.
pub fn status_body(epoch: u64, nonce: u64) -> String {
    serde_json::json!({
        "data": { "metrics": { "drt_epoch_number": epoch, "drt_nonce": nonce } },
        "code": "successful",
    })
    .to_string()
}

/// 200 response carrying a node status document.
pub fn status_response(epoch: u64, nonce: u64) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "application/json")
        .set_body_string(status_body(epoch, nonce))
}
