//! HTTP client for the back-office REST API.
//!
//! Wraps `reqwest` with the base URL, bearer token and timeout from the active
//! profile, and maps response statuses onto [`ConsoleError`].

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{ConsoleError, Result};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Query pairs appended to a request, e.g. `skip`/`limit`.
pub type Query = Vec<(&'static str, String)>;

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new<C: ConfigProvider + ?Sized>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds()))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            token: config.token().map(str::to_string),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.request(Method::GET, path).query(query);
        self.send_json(request, "GET", path).await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, path).json(body);
        self.send_json(request, "POST", path).await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PUT, path).json(body);
        self.send_json(request, "PUT", path).await
    }

    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, path).json(body);
        self.send_json(request, "PATCH", path).await
    }

    /// DELETE ignores whatever body the server sends back.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let request = self.request(Method::DELETE, path);
        let response = request.send().await?;
        tracing::debug!("DELETE {} -> {}", path, response.status());
        check_status(response, path).await?;
        Ok(())
    }

    /// Multipart upload with a single `file` part.
    pub async fn upload<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        file_name: &str,
        data: Vec<u8>,
    ) -> Result<T> {
        let part = Part::bytes(data).file_name(file_name.to_string());
        let form = Form::new().part("file", part);
        let request = self.request(Method::POST, path).query(query).multipart(form);
        self.send_json(request, "POST", path).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        method: &str,
        path: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        tracing::debug!("{} {} -> {}", method, path, response.status());

        let response = check_status(response, path).await?;
        let body = response.bytes().await?;

        // 204 或空回應
        if body.is_empty() {
            return Ok(serde_json::from_value(serde_json::Value::Null)?);
        }
        Ok(serde_json::from_slice(&body)?)
    }
}

async fn check_status(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED => Err(ConsoleError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ConsoleError::NotFound {
            path: path.to_string(),
        }),
        _ => {
            let body = response.text().await.unwrap_or_default();
            Err(ConsoleError::ApiStatus {
                status: status.as_u16(),
                message: error_message(&body, status),
            })
        }
    }
}

/// Pulls the human-readable message out of an error body.
///
/// The backend answers `{"detail": "..."}`, or for request validation
/// failures `{"detail": [{"msg": "..."}, ...]}`; some routes use `message`.
fn error_message(body: &str, status: StatusCode) -> String {
    let fallback = || {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    };

    let Ok(json) = serde_json::from_str::<serde_json::Value>(body) else {
        let trimmed = body.trim();
        return if trimmed.is_empty() {
            fallback()
        } else {
            trimmed.to_string()
        };
    };

    match json.get("detail").or_else(|| json.get("message")) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                fallback()
            } else {
                messages.join("; ")
            }
        }
        _ => fallback(),
    }
}
