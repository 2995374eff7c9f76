//! Session telemetry.
//!
//! The server owns the session record; the client only holds its id and a
//! local cycle counter. Every call is best-effort: failures are logged and
//! the exercise carries on. Without an id, later calls do nothing.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionAction {
    Start,
    Update,
    Complete,
    Cancel,
}

/// Opaque server-issued session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SessionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => SessionId(n.to_string()),
            Raw::Text(s) => SessionId(s),
        })
    }
}

/// Body of `POST /breathe/api/session/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRequest {
    pub action: SessionAction,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technique_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vibration_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycles_completed: Option<u64>,
}

impl SessionRequest {
    pub fn start(technique_id: Option<u64>, sound_enabled: bool, vibration_enabled: bool) -> Self {
        Self {
            action: SessionAction::Start,
            technique_id,
            sound_enabled: Some(sound_enabled),
            vibration_enabled: Some(vibration_enabled),
            session_id: None,
            cycles_completed: None,
        }
    }

    pub fn progress(action: SessionAction, session_id: SessionId, cycles_completed: u64) -> Self {
        Self {
            action,
            technique_id: None,
            sound_enabled: None,
            vibration_enabled: None,
            session_id: Some(session_id),
            cycles_completed: Some(cycles_completed),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Server endpoint for session lifecycle calls.
#[async_trait]
pub trait SessionApi: Send + Sync + 'static {
    async fn session(&self, request: &SessionRequest) -> Result<SessionResponse, ApiError>;
}

#[derive(Debug, Clone)]
enum Command {
    Start {
        technique_id: Option<u64>,
        sound_enabled: bool,
        vibration_enabled: bool,
    },
    Progress {
        action: SessionAction,
        cycles_completed: u64,
    },
}

/// Handle to the background task that talks to the session endpoint.
///
/// Commands are processed strictly in order, so a cycle update sent right
/// after `start` still sees the id returned by the server.
pub struct SessionReporter {
    tx: Option<mpsc::UnboundedSender<Command>>,
    worker: Option<JoinHandle<Option<SessionId>>>,
}

impl SessionReporter {
    /// Spawn the worker on the current tokio runtime.
    pub fn spawn<A: SessionApi>(api: A) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(api, rx));
        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// A reporter that drops everything. Used when telemetry is off.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    pub fn start(&self, technique_id: Option<u64>, sound_enabled: bool, vibration_enabled: bool) {
        self.send(Command::Start {
            technique_id,
            sound_enabled,
            vibration_enabled,
        });
    }

    pub fn cycles(&self, cycles_completed: u64) {
        self.send(Command::Progress {
            action: SessionAction::Update,
            cycles_completed,
        });
    }

    pub fn complete(&self, cycles_completed: u64) {
        self.send(Command::Progress {
            action: SessionAction::Complete,
            cycles_completed,
        });
    }

    pub fn cancel(&self, cycles_completed: u64) {
        self.send(Command::Progress {
            action: SessionAction::Cancel,
            cycles_completed,
        });
    }

    fn send(&self, command: Command) {
        if let Some(tx) = &self.tx {
            if tx.send(command).is_err() {
                tracing::debug!("session reporter already stopped");
            }
        }
    }

    /// Stop accepting commands and wait up to `limit` for queued ones to
    /// drain. Returns the session id the server issued, if any.
    pub async fn finish(mut self, limit: Duration) -> Option<SessionId> {
        self.tx.take();
        let worker = self.worker.take()?;
        match tokio::time::timeout(limit, worker).await {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => {
                tracing::error!("session reporter task failed: {e}");
                None
            }
            Err(_) => {
                tracing::warn!("gave up waiting for session telemetry after {limit:?}");
                None
            }
        }
    }
}

async fn run_worker<A: SessionApi>(
    api: A,
    mut rx: mpsc::UnboundedReceiver<Command>,
) -> Option<SessionId> {
    let mut session_id: Option<SessionId> = None;
    while let Some(command) = rx.recv().await {
        match command {
            Command::Start {
                technique_id,
                sound_enabled,
                vibration_enabled,
            } => {
                let request = SessionRequest::start(technique_id, sound_enabled, vibration_enabled);
                match api.session(&request).await {
                    Ok(SessionResponse {
                        success: true,
                        session_id: Some(id),
                        ..
                    }) => {
                        tracing::info!(session_id = %id, "breathing session created");
                        session_id = Some(id);
                    }
                    Ok(resp) => {
                        tracing::warn!(error = ?resp.error, "server did not create a session");
                    }
                    Err(e) => tracing::error!("Error creating session: {e}"),
                }
            }
            Command::Progress {
                action,
                cycles_completed,
            } => {
                let Some(id) = session_id.clone() else {
                    tracing::debug!(?action, "no session id; skipping");
                    continue;
                };
                let request = SessionRequest::progress(action, id, cycles_completed);
                match api.session(&request).await {
                    Ok(resp) if !resp.success => {
                        tracing::warn!(?action, error = ?resp.error, "session update refused");
                    }
                    Ok(_) => tracing::debug!(?action, cycles_completed, "session updated"),
                    Err(e) => tracing::error!(?action, "Error updating session: {e}"),
                }
            }
        }
    }
    session_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct FakeApi {
        calls: Arc<Mutex<Vec<SessionRequest>>>,
        fail_start: bool,
    }

    #[async_trait]
    impl SessionApi for FakeApi {
        async fn session(&self, request: &SessionRequest) -> Result<SessionResponse, ApiError> {
            self.calls.lock().unwrap().push(request.clone());
            if request.action == SessionAction::Start && self.fail_start {
                return Err(ApiError::Status {
                    path: "/breathe/api/session/".into(),
                    status: 500,
                    body: String::new(),
                });
            }
            Ok(SessionResponse {
                success: true,
                session_id: Some(SessionId("41".into())),
                error: None,
            })
        }
    }

    #[test]
    fn session_id_accepts_numbers_and_strings() {
        let a: SessionResponse = serde_json::from_str(r#"{"success":true,"session_id":41}"#).unwrap();
        let b: SessionResponse = serde_json::from_str(r#"{"success":true,"session_id":"41"}"#).unwrap();
        assert_eq!(a.session_id, b.session_id);
    }

    #[test]
    fn progress_request_omits_start_fields() {
        let req = SessionRequest::progress(SessionAction::Complete, SessionId("9".into()), 3);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action":"complete","session_id":"9","cycles_completed":3})
        );
    }

    #[tokio::test]
    async fn updates_follow_the_issued_id_in_order() {
        let api = FakeApi::default();
        let reporter = SessionReporter::spawn(api.clone());
        reporter.start(Some(5), true, false);
        reporter.cycles(1);
        reporter.complete(2);
        let id = reporter.finish(Duration::from_secs(1)).await;
        assert_eq!(id, Some(SessionId("41".into())));

        let calls = api.calls.lock().unwrap();
        let actions: Vec<_> = calls.iter().map(|c| c.action).collect();
        assert_eq!(
            actions,
            vec![SessionAction::Start, SessionAction::Update, SessionAction::Complete]
        );
        assert_eq!(calls[2].cycles_completed, Some(2));
    }

    #[tokio::test]
    async fn failed_start_turns_later_calls_into_no_ops() {
        let api = FakeApi {
            fail_start: true,
            ..FakeApi::default()
        };
        let reporter = SessionReporter::spawn(api.clone());
        reporter.start(None, true, true);
        reporter.cycles(1);
        reporter.cancel(1);
        assert_eq!(reporter.finish(Duration::from_secs(1)).await, None);
        assert_eq!(api.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn disabled_reporter_ignores_everything() {
        let reporter = SessionReporter::disabled();
        reporter.start(None, true, true);
        reporter.complete(4);
        assert_eq!(reporter.finish(Duration::from_millis(10)).await, None);
    }
}
