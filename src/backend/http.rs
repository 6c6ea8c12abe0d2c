//! HTTP backend implementation talking to the task service REST API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use super::{
    Backend, BackendError, Completion, CompletionContent, CreateCompletionArgs, CreateTaskArgs, Organization,
    Requirement, Task, TaskFilter, UpdateTaskArgs,
};

/// REST backend authenticated with a bearer token.
pub struct HttpBackend {
    http: Client,
    base_url: String,
    api_token: String,
}

impl HttpBackend {
    /// Create a new HTTP backend.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, api_token: String, timeout: Duration) -> Result<Self, BackendError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.bearer_auth(&self.api_token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;

        let response = Self::check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::InvalidData(format!("Failed to decode response: {e}")))
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        body: &B,
    ) -> Result<T, BackendError> {
        self.send(request.json(body)).await
    }

    async fn check_status(response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(Self::status_error(status, body))
    }

    fn status_error(status: StatusCode, body: String) -> BackendError {
        let message = if body.is_empty() {
            status.to_string()
        } else {
            format!("{status}: {body}")
        };

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::Auth(message),
            StatusCode::NOT_FOUND => BackendError::NotFound(message),
            s if s.is_client_error() => BackendError::InvalidData(message),
            _ => BackendError::Other(message),
        }
    }

    async fn completion_form(args: &CreateCompletionArgs) -> Result<Form, BackendError> {
        let mut form = Form::new();
        if let Some(requirement_id) = args.requirement_id {
            form = form.text("requirement_id", requirement_id.to_string());
        }

        match &args.content {
            CompletionContent::Text { text } => Ok(form.text("text", text.clone())),
            CompletionContent::File { file } => {
                let bytes = tokio::fs::read(&file.path).await.map_err(|e| {
                    BackendError::InvalidData(format!("Failed to read {}: {e}", file.path.display()))
                })?;

                let mut part = Part::bytes(bytes).file_name(file.file_name.clone());
                if let Some(mime_type) = &file.mime_type {
                    part = part
                        .mime_str(mime_type)
                        .map_err(|e| BackendError::InvalidData(format!("Invalid mime type {mime_type}: {e}")))?;
                }
                Ok(form.part("file", part))
            }
        }
    }
}

#[async_trait]
impl Backend for HttpBackend {
    fn backend_type(&self) -> &str {
        "http"
    }

    async fn fetch_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, BackendError> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(organization_id) = filter.organization_id {
            query.push(("organization_id", organization_id.to_string()));
        }
        if let Some(status) = filter.status {
            query.push(("status", status.to_string()));
        }

        self.send(self.http.get(self.url("tasks")).query(&query)).await
    }

    async fn fetch_task(&self, task_id: i64) -> Result<Task, BackendError> {
        self.send(self.http.get(self.url(&format!("tasks/{task_id}")))).await
    }

    async fn fetch_organizations(&self) -> Result<Vec<Organization>, BackendError> {
        self.send(self.http.get(self.url("organizations"))).await
    }

    async fn create_task(&self, args: CreateTaskArgs) -> Result<Task, BackendError> {
        self.send_json(self.http.post(self.url("tasks")), &args).await
    }

    async fn update_task(&self, task_id: i64, args: UpdateTaskArgs) -> Result<Task, BackendError> {
        self.send_json(self.http.patch(self.url(&format!("tasks/{task_id}"))), &args)
            .await
    }

    async fn submit_task(&self, task_id: i64) -> Result<Task, BackendError> {
        self.send(self.http.post(self.url(&format!("tasks/{task_id}/submit"))))
            .await
    }

    async fn set_requirement_completion(
        &self,
        requirement_id: i64,
        completed: bool,
    ) -> Result<Requirement, BackendError> {
        let body = serde_json::json!({ "completed": completed });
        self.send_json(self.http.patch(self.url(&format!("requirements/{requirement_id}"))), &body)
            .await
    }

    async fn create_completion(&self, args: CreateCompletionArgs) -> Result<Completion, BackendError> {
        let url = self.url(&format!("tasks/{}/completions", args.task_id));
        let form = Self::completion_form(&args).await?;
        self.send(self.http.post(url).multipart(form)).await
    }
}
