#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use car_scout::api::{ApiRequest, ApiResponse, Transport};
use car_scout::config::{ApiSettings, Credentials};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const BASE_URL: &str = "http://webmotors.test";

/// Replays canned responses in order and records every request it sees.
/// Once the script runs out every call fails like a dropped connection.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, String>>>>,
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.responses.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn respond_raw(self, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn token_requests(&self) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with("/oauth/token"))
            .count()
    }

    pub fn requests_to(&self, suffix: &str) -> Vec<ApiRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(suffix))
            .collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("connection refused")),
        }
    }
}

pub fn settings() -> ApiSettings {
    ApiSettings::new(Credentials::new("client-id", "client-secret", "api-user", "api-pass"))
        .with_base_url(BASE_URL)
}

pub fn token(value: &str) -> Value {
    serde_json::json!({ "access_token": value, "token_type": "bearer", "expires_in": 3600 })
}
