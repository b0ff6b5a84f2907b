#![allow(dead_code)]

// Offline HTTP executor serving canned bodies per URL
use async_trait::async_trait;
use scanmanga::http_client::{HttpExecutor, SourceRequest, SourceResponse};
use scanmanga::Result;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct StubExecutor {
    routes: HashMap<String, (u16, String)>,
    requests: Mutex<Vec<SourceRequest>>,
}

impl StubExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, body: &str) -> Self {
        self.routes.insert(url.to_string(), (200, body.to_string()));
        self
    }

    pub fn route_with_status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.routes.insert(url.to_string(), (status, body.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<SourceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpExecutor for StubExecutor {
    async fn execute(&self, request: SourceRequest) -> Result<SourceResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let (status, body) = self
            .routes
            .get(&request.url)
            .cloned()
            .unwrap_or((404, String::new()));

        Ok(SourceResponse {
            status,
            url: request.url,
            body,
        })
    }
}
