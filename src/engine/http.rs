// src/engine/http.rs

//! HTTP implementation of the scheduler backend.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::engine::api::{RegisteredPipeline, RunId, RunStatus, TriggeredRun};
use crate::engine::backend::SchedulerBackend;
use crate::errors::{LakedagError, Result};
use crate::pipeline::PipelineSpec;

/// Client for the scheduler's HTTP API.
///
/// Endpoints used:
/// - `PUT  /api/2.0/pipelines/{name}`: register (upsert) a definition
/// - `POST /api/2.0/pipelines/{name}/trigger`: start a run now
/// - `GET  /api/2.0/runs/{id}`: poll a run
#[derive(Debug, Clone)]
pub struct HttpScheduler {
    base_url: String,
    http: HttpClient,
    token: Option<String>,
}

impl HttpScheduler {
    /// Create a client for the scheduler at `base_url`
    /// (e.g. `"http://localhost:8080"`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(LakedagError::ConfigError(format!(
                "scheduler URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            http,
            token: None,
        })
    }

    /// Set a bearer token sent in the `Authorization` header.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Build a full URL from a path.
    fn url(&self, path: &str) -> String {
        let path = path.strip_prefix('/').unwrap_or(path);
        format!("{}/api/2.0/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Add authentication headers to a request.
    fn with_auth(&self, builder: RequestBuilder) -> RequestBuilder {
        if let Some(ref token) = self.token {
            builder.header("Authorization", format!("Bearer {}", token))
        } else {
            builder
        }
    }

    /// Handle a response and deserialize JSON, extracting the scheduler's
    /// error message on failure.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(LakedagError::Http);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        // Error bodies are usually JSON with an "error" or "message" field.
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|json| {
                json["error"]
                    .as_str()
                    .or_else(|| json["message"].as_str())
                    .map(str::to_string)
            })
            .unwrap_or(body);

        Err(LakedagError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn put_pipeline(&self, spec: &PipelineSpec) -> Result<RegisteredPipeline> {
        let url = self.url(&format!("pipelines/{}", spec.name));
        debug!(pipeline = %spec.name, url = %url, "registering pipeline");

        let response = self.with_auth(self.http.put(&url)).json(spec).send().await?;
        Self::handle_response(response).await
    }

    async fn post_trigger(&self, name: &str) -> Result<RunId> {
        let url = self.url(&format!("pipelines/{}/trigger", name));
        debug!(pipeline = %name, url = %url, "triggering run");

        let response = self.with_auth(self.http.post(&url)).send().await?;
        let triggered: TriggeredRun = Self::handle_response(response).await?;
        Ok(triggered.run_id)
    }

    async fn get_run(&self, run: &RunId) -> Result<RunStatus> {
        let url = self.url(&format!("runs/{}", run));

        let response = self.with_auth(self.http.get(&url)).send().await?;
        Self::handle_response(response).await
    }
}

impl SchedulerBackend for HttpScheduler {
    fn register_pipeline(
        &mut self,
        spec: PipelineSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RegisteredPipeline>> + Send + '_>> {
        Box::pin(async move { self.put_pipeline(&spec).await })
    }

    fn trigger_run(
        &mut self,
        name: String,
    ) -> Pin<Box<dyn Future<Output = Result<RunId>> + Send + '_>> {
        Box::pin(async move { self.post_trigger(&name).await })
    }

    fn run_state(
        &mut self,
        run: RunId,
    ) -> Pin<Box<dyn Future<Output = Result<RunStatus>> + Send + '_>> {
        Box::pin(async move { self.get_run(&run).await })
    }
}
