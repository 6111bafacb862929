use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

pub const BROWSER_USE_API: &str = "https://api.browser-use.com/api/v2";

#[derive(Debug, Error)]
pub enum PollError {
    #[error("Task {task_id} timed out after {waited_secs}s")]
    TimedOut { task_id: String, waited_secs: u64 },
}

/// How long to wait for a remote task and how often to ask
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            max_wait: Duration::from_secs(600),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionRequest<'a> {
    profile_id: &'a str,
    persist_memory: bool,
    keep_alive: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskRequest<'a> {
    task: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct Created {
    id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskStatus {
    pub status: String,
    #[serde(default)]
    pub output: Option<String>,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        self.status == "finished" || self.status == "stopped"
    }
}

/// Client for the Browser Use Cloud task API
pub struct BrowserUseClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl BrowserUseClient {
    pub fn new(api_key: String) -> Result<Self> {
        Self::with_base_url(api_key, BROWSER_USE_API)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Open a browser session bound to a saved profile (logged-in cookies).
    pub async fn create_session(&self, profile_id: &str) -> Result<String> {
        let request = SessionRequest {
            profile_id,
            persist_memory: true,
            keep_alive: false,
        };

        let response = self
            .client
            .post(format!("{}/sessions", self.base_url))
            .header("X-Browser-Use-API-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send session request to Browser Use")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Failed to create session ({}): {}", status, error_text);
        }

        let created = response
            .json::<Created>()
            .await
            .context("Failed to parse session response")?;

        Ok(created.id)
    }

    pub async fn create_task(&self, prompt: &str, session_id: Option<&str>) -> Result<String> {
        let request = TaskRequest {
            task: prompt,
            session_id,
        };

        let response = self
            .client
            .post(format!("{}/tasks", self.base_url))
            .header("X-Browser-Use-API-Key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send task request to Browser Use")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Failed to create task ({}): {}", status, error_text);
        }

        let created = response
            .json::<Created>()
            .await
            .context("Failed to parse task response")?;

        Ok(created.id)
    }

    pub async fn get_task_status(&self, task_id: &str) -> Result<TaskStatus> {
        let response = self
            .client
            .get(format!("{}/tasks/{}/status", self.base_url, task_id))
            .header("X-Browser-Use-API-Key", &self.api_key)
            .send()
            .await
            .context("Failed to fetch task status")?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!("Failed to get task status ({}): {}", status, error_text);
        }

        response
            .json::<TaskStatus>()
            .await
            .context("Failed to parse task status")
    }

    /// Poll until the task finishes or stops, returning its raw output.
    /// Fails with [`PollError::TimedOut`] once `settings.max_wait` elapses.
    pub async fn poll_until_done(&self, task_id: &str, settings: PollSettings) -> Result<String> {
        let start = Instant::now();

        while start.elapsed() < settings.max_wait {
            let status = self.get_task_status(task_id).await?;
            info!(task_id, status = %status.status, "task status");

            if status.is_terminal() {
                return Ok(status.output.unwrap_or_default());
            }

            debug!(interval = ?settings.interval, "task still running, sleeping");
            tokio::time::sleep(settings.interval).await;
        }

        Err(PollError::TimedOut {
            task_id: task_id.to_string(),
            waited_secs: settings.max_wait.as_secs(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_poll() -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(10),
            max_wait: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_create_task_without_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .and(header("X-Browser-Use-API-Key", "key"))
            .and(body_json(json!({ "task": "do it" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "task-1" })))
            .mount(&server)
            .await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        let id = client.create_task("do it", None).await.unwrap();
        assert_eq!(id, "task-1");
    }

    #[tokio::test]
    async fn test_create_session_sends_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .and(body_json(json!({
                "profileId": "profile-9",
                "persistMemory": true,
                "keepAlive": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "sess-1" })))
            .mount(&server)
            .await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        assert_eq!(client.create_session("profile-9").await.unwrap(), "sess-1");
    }

    #[tokio::test]
    async fn test_create_task_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/tasks"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        let err = client.create_task("do it", None).await.unwrap_err();
        assert!(err.to_string().contains("401"));
        assert!(err.to_string().contains("bad key"));
    }

    #[tokio::test]
    async fn test_poll_returns_output_when_finished() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t1/status"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "status": "finished", "output": "{\"posts\": []}" })),
            )
            .mount(&server)
            .await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        let output = client.poll_until_done("t1", fast_poll()).await.unwrap();
        assert_eq!(output, "{\"posts\": []}");
    }

    #[tokio::test]
    async fn test_poll_stopped_without_output() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t2/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "stopped" })))
            .mount(&server)
            .await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        assert_eq!(client.poll_until_done("t2", fast_poll()).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_poll_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tasks/t3/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "running" })))
            .mount(&server)
            .await;

        let client = BrowserUseClient::with_base_url("key".to_string(), server.uri()).unwrap();
        let err = client.poll_until_done("t3", fast_poll()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PollError>(),
            Some(PollError::TimedOut { .. })
        ));
    }
}
