use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::AppConfig;
use crate::errors::RequestError;
use crate::process::{ActionRequest, LogStream, NewProcess, ProcessAction, ProcessLogs, ProcessSummary};

const TOKEN_HEADER: &str = "token";
const JSON: &str = "application/json";

/// Operations the supervisor exposes over HTTP.
///
/// Controllers are generic over this trait so they can be exercised without a
/// live supervisor.
#[allow(async_fn_in_trait)]
pub trait Supervisor {
    async fn list_processes(&self) -> Result<Vec<ProcessSummary>, RequestError>;
    async fn process_info(&self, id: u64) -> Result<ProcessSummary, RequestError>;
    async fn create_process(&self, spec: &NewProcess) -> Result<Value, RequestError>;
    async fn perform_action(&self, id: u64, action: ProcessAction) -> Result<Value, RequestError>;
    async fn process_logs(&self, id: u64, stream: LogStream) -> Result<ProcessLogs, RequestError>;
    async fn rename_process(&self, id: u64, name: &str) -> Result<Value, RequestError>;
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: base.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.api_base.clone(), config.token.clone())
    }

    fn request(&self, method: Method, endpoint: &str, content_type: &'static str) -> RequestBuilder {
        let url = format!("{}{endpoint}", self.base);
        debug!("{method} {url}");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        if let Some(token) = self.token.as_deref() {
            if let Ok(value) = HeaderValue::from_str(token) {
                headers.insert(TOKEN_HEADER, value);
            }
        }
        self.http.request(method, url).headers(headers)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RequestError> {
        let response = request.send().await.inspect_err(|err| {
            debug!("supervisor request failed: {err}");
        })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!("supervisor answered {status}");
            return Err(RequestError::http(status.as_u16(), &body));
        }

        Ok(serde_json::from_str(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RequestError> {
        self.send(self.request(Method::GET, endpoint, JSON)).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        self.send(self.request(Method::POST, endpoint, JSON).json(body))
            .await
    }
}

impl Supervisor for ApiClient {
    async fn list_processes(&self) -> Result<Vec<ProcessSummary>, RequestError> {
        self.get("/list").await
    }

    async fn process_info(&self, id: u64) -> Result<ProcessSummary, RequestError> {
        self.get(&format!("/process/{id}/info")).await
    }

    async fn create_process(&self, spec: &NewProcess) -> Result<Value, RequestError> {
        self.post_json("/process/create", spec).await
    }

    async fn perform_action(&self, id: u64, action: ProcessAction) -> Result<Value, RequestError> {
        self.post_json(
            &format!("/process/{id}/action"),
            &ActionRequest { method: action },
        )
        .await
    }

    async fn process_logs(&self, id: u64, stream: LogStream) -> Result<ProcessLogs, RequestError> {
        self.get(&format!("/process/{id}/logs/{stream}")).await
    }

    async fn rename_process(&self, id: u64, name: &str) -> Result<Value, RequestError> {
        let request = self
            .request(Method::POST, &format!("/process/{id}/rename"), "text/plain")
            .body(name.to_string());
        self.send(request).await
    }
}
