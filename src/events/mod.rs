//! Failure events: one record per request that ended in a 5xx.
//!
//! Recording is best effort. A recorder that cannot write logs a warning and
//! the client still receives the original error response.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::app::AppState;
use crate::errors::FailureDetail;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailureEvent {
    pub id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub method: String,
    pub path: String,
    pub status: u16,
    pub detail: Option<String>,
}

impl FailureEvent {
    pub fn new(method: impl Into<String>, path: impl Into<String>, status: u16, detail: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            method: method.into(),
            path: path.into(),
            status,
            detail,
        }
    }
}

#[async_trait]
pub trait FailureRecorder: Send + Sync {
    async fn record_failure(&self, event: FailureEvent) -> anyhow::Result<()>;
}

/// Discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoopRecorder;

#[async_trait]
impl FailureRecorder for NoopRecorder {
    async fn record_failure(&self, _event: FailureEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Appends each event as one JSON line.
#[derive(Debug, Clone)]
pub struct JsonLinesRecorder {
    path: PathBuf,
}

impl JsonLinesRecorder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FailureRecorder for JsonLinesRecorder {
    async fn record_failure(&self, event: FailureEvent) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut line = serde_json::to_vec(&event)?;
        line.push(b'\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&line).await?;
        Ok(())
    }
}

/// Keeps events in memory; lets tests assert on what was recorded.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<FailureEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<FailureEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl FailureRecorder for MemoryRecorder {
    async fn record_failure(&self, event: FailureEvent) -> anyhow::Result<()> {
        self.events
            .lock()
            .map_err(|_| anyhow::anyhow!("failure recorder lock poisoned"))?
            .push(event);
        Ok(())
    }
}

/// Middleware reporting every 5xx response to the configured recorder.
pub async fn record_failures(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let response = next.run(request).await;

    if response.status().is_server_error() {
        let detail = response.extensions().get::<FailureDetail>().map(|d| d.0.clone());
        let event = FailureEvent::new(method, path, response.status().as_u16(), detail);
        if let Err(err) = state.failures.record_failure(event).await {
            tracing::warn!(error = %err, "failed to record failure event");
        }
    }

    response
}
