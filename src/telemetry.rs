//! Session-scoped telemetry: tags, timestamps and an ordered event log,
//! optionally shipped to an HTTP ingestion endpoint when the session ends.

use std::env;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::{Value, json};
use uuid::Uuid;

use crate::error::Result;

/// Ingestion endpoint for finished sessions. Shipping is skipped when unset.
pub const TELEMETRY_ENDPOINT_ENV: &str = "TELEMETRY_ENDPOINT";
pub const TELEMETRY_API_KEY_ENV: &str = "TELEMETRY_API_KEY";

const SHIP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    SessionStarted,
    LlmCall { model: String },
    ToolExecution { tool: String, ok: bool },
    SessionEnded,
}

#[derive(Debug, Clone, Serialize)]
pub struct TelemetryEvent {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EventKind,
}

#[derive(Debug)]
struct SessionState {
    events: Vec<TelemetryEvent>,
    ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
pub struct TelemetrySession {
    id: Uuid,
    tags: Vec<String>,
    started_at: DateTime<Utc>,
    state: Mutex<SessionState>,
}

impl TelemetrySession {
    /// Open a tagged session and record its start.
    pub fn init<I: Into<String>>(tags: impl IntoIterator<Item = I>) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            tags: tags.into_iter().map(Into::into).collect(),
            started_at: Utc::now(),
            state: Mutex::new(SessionState {
                events: Vec::new(),
                ended_at: None,
            }),
        };
        session.record(EventKind::SessionStarted);
        info!(
            "Telemetry session {} started (tags: {:?})",
            session.id, session.tags
        );
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn record(&self, kind: EventKind) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.ended_at.is_some() {
            warn!("Telemetry session {} already ended, dropping event", self.id);
            return;
        }
        state.events.push(TelemetryEvent {
            at: Utc::now(),
            kind,
        });
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.events.clone()
    }

    /// Close the session. When an ingestion endpoint is configured the
    /// session payload is POSTed there; a failed ship is logged, never fatal.
    pub fn end(&self) {
        {
            let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
            if state.ended_at.is_some() {
                warn!("Telemetry session {} already ended", self.id);
                return;
            }
            state.events.push(TelemetryEvent {
                at: Utc::now(),
                kind: EventKind::SessionEnded,
            });
            state.ended_at = Some(Utc::now());
        }
        info!("Telemetry session {} ended", self.id);

        match env::var(TELEMETRY_ENDPOINT_ENV) {
            Ok(endpoint) => {
                if let Err(e) = self.ship(&endpoint) {
                    warn!("Failed to ship telemetry session {}: {}", self.id, e);
                }
            }
            Err(_) => {
                debug!(
                    "{} not set, keeping telemetry session {} local",
                    TELEMETRY_ENDPOINT_ENV, self.id
                );
            }
        }
    }

    fn payload(&self) -> Value {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        json!({
            "session_id": self.id,
            "tags": self.tags,
            "started_at": self.started_at,
            "ended_at": state.ended_at,
            "events": state.events,
        })
    }

    fn ship(&self, endpoint: &str) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(SHIP_TIMEOUT_SECS))
            .build()?;

        let mut request = client.post(endpoint).json(&self.payload());
        if let Ok(api_key) = env::var(TELEMETRY_API_KEY_ENV) {
            request = request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            crate::bail!("telemetry endpoint returned status {}", status);
        }
        debug!("Telemetry session {} shipped to {}", self.id, endpoint);
        Ok(())
    }
}
