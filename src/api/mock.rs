//! In-memory transport for unit tests: no sockets, no loopback servers.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use super::fetch::{FetchError, HttpResponse, HttpTransport};

#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    routes: HashMap<String, VecDeque<Result<HttpResponse, FetchError>>>,
    requests: Vec<String>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for `url`. Queued results are returned in FIFO order and
    /// the last one is repeated once the queue runs dry. Unregistered URLs fail
    /// with a retryable connection error.
    pub fn push(&self, url: impl Into<String>, result: Result<HttpResponse, FetchError>) {
        let mut inner = self.inner.lock().expect("mock lock poisoned");
        inner.routes.entry(url.into()).or_default().push_back(result);
    }

    pub fn push_json(&self, url: impl Into<String>, value: Value) {
        self.push_body(url, serde_json::to_vec(&value).expect("serializable json"));
    }

    pub fn push_body(&self, url: impl Into<String>, body: Vec<u8>) {
        self.push(url, Ok(HttpResponse { status: 200, body }));
    }

    pub fn push_status(&self, url: impl Into<String>, status: u16) {
        self.push(
            url,
            Ok(HttpResponse {
                status,
                body: Vec::new(),
            }),
        );
    }

    pub fn push_error(&self, url: impl Into<String>, error: FetchError) {
        self.push(url, Err(error));
    }

    pub fn requests(&self) -> Vec<String> {
        self.inner.lock().expect("mock lock poisoned").requests.clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, FetchError> {
        let mut inner = self.inner.lock().expect("mock lock poisoned");
        inner.requests.push(url.to_string());
        match inner.routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().expect("non-empty queue"),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err(FetchError::Connect {
                url: url.to_string(),
                reason: "no mock response registered".to_string(),
            }),
        }
    }
}
