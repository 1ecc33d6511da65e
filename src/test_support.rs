use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::core::config::Settings;
use crate::core::state::AppState;
use crate::schemas::gateway::{Action, GatewayReply};
use crate::schemas::rubric::percentage_of_max;
use crate::schemas::submission::{Grade, ReviewStatus, Room, RubricReview, SubmissionRecord};
use crate::services::gateway::{Gateway, TransportError};
use crate::services::notifier::Notifier;

pub(crate) const TEACHER_USER: &str = "krunoi";
pub(crate) const TEACHER_PIN: &str = "2468";
pub(crate) const TEACHER_NAME: &str = "Kru Noi";

pub(crate) fn env_lock_blocking() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears the given variables and restores their previous values on drop.
pub(crate) struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub(crate) fn clear(keys: &[&str]) -> Self {
        let saved = keys
            .iter()
            .map(|key| {
                let previous = std::env::var(key).ok();
                std::env::remove_var(key);
                (key.to_string(), previous)
            })
            .collect();
        Self { saved }
    }

    pub(crate) fn set(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, previous) in &self.saved {
            match previous {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

pub(crate) fn record(row_id: i64, name: &str, student_number: &str) -> SubmissionRecord {
    SubmissionRecord {
        row_id: Some(row_id),
        timestamp: Some("2025-01-02T10:20:30Z".to_string()),
        name: name.to_string(),
        student_number: student_number.to_string(),
        grade: Grade::Prathom5,
        room: Room::Room1,
        file_url: Some(format!("https://drive.example.com/v/{row_id}")),
        review: None,
        reactions: None,
    }
}

pub(crate) fn review(total_score: i32) -> RubricReview {
    let base = total_score / 4;
    let extra = total_score % 4;
    RubricReview {
        content_accuracy: base + extra,
        participation: base,
        presentation: base,
        discipline: base,
        total_score,
        percentage: percentage_of_max(total_score),
        comment: "Well done".to_string(),
        graded_at: Some("2025-01-03T09:00:00Z".to_string()),
        status: ReviewStatus::Graded,
    }
}

pub(crate) fn graded(mut record: SubmissionRecord, total_score: i32) -> SubmissionRecord {
    record.review = Some(review(total_score));
    record
}

/// Lets a test hold one gateway call open until `release`.
pub(crate) struct Gate {
    tx: oneshot::Sender<()>,
}

impl Gate {
    pub(crate) fn release(self) {
        let _ = self.tx.send(());
    }
}

#[derive(Default)]
struct MemoryState {
    records: Vec<SubmissionRecord>,
    next_row_id: i64,
}

/// In-memory stand-in for the spreadsheet script: every action behaves the way
/// the remote store does, and every call is recorded.
pub(crate) struct MemoryGateway {
    state: Mutex<MemoryState>,
    calls: Mutex<Vec<(Action, Value)>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl MemoryGateway {
    pub(crate) fn new() -> Arc<Self> {
        Self::with_records(Vec::new())
    }

    pub(crate) fn with_records(records: Vec<SubmissionRecord>) -> Arc<Self> {
        let next_row_id = records.iter().filter_map(|record| record.row_id).max().unwrap_or(1) + 1;
        Arc::new(Self {
            state: Mutex::new(MemoryState { records, next_row_id }),
            calls: Mutex::new(Vec::new()),
            gate: Mutex::new(None),
        })
    }

    pub(crate) fn push_record(&self, record: SubmissionRecord) {
        let mut state = self.state.lock().expect("state lock");
        state.next_row_id = state.next_row_id.max(record.row_id.unwrap_or(0) + 1);
        state.records.push(record);
    }

    /// Grades a row out-of-band, as another teacher would.
    pub(crate) fn set_review(&self, row_id: i64, review: RubricReview) {
        let mut state = self.state.lock().expect("state lock");
        if let Some(record) = state.records.iter_mut().find(|record| record.row_id == Some(row_id)) {
            record.review = Some(review);
        }
    }

    pub(crate) fn calls(&self) -> Vec<(Action, Value)> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub(crate) fn call_count(&self, action: Action) -> usize {
        self.calls().iter().filter(|(called, _)| *called == action).count()
    }

    /// Holds the next call open until `release`. Its reply is computed when the
    /// call arrives, so a held call answers with the data as it was then.
    pub(crate) fn hold_next_call(&self) -> Gate {
        let (tx, rx) = oneshot::channel();
        *self.gate.lock().expect("gate lock") = Some(rx);
        Gate { tx }
    }

    fn handle(&self, action: Action, data: &Value) -> GatewayReply {
        let mut state = self.state.lock().expect("state lock");
        match action {
            Action::List => GatewayReply::ok(Some(
                serde_json::to_value(&state.records).expect("records serialize"),
            )),
            Action::GetRubric => GatewayReply::ok(Some(json!([
                {"name": "Content accuracy", "description": "Moves match the routine", "maxScore": 5},
                {"name": "Participation", "description": "Everyone joins in", "maxScore": 5},
                {"name": "Presentation", "description": "Clear and confident", "maxScore": 5},
                {"name": "Discipline", "description": "Safe and orderly", "maxScore": 5}
            ]))),
            Action::Upload => {
                let field = |key: &str| data.get(key).and_then(Value::as_str).unwrap_or_default();
                let (Ok(grade), Ok(room)) = (field("grade").parse::<Grade>(), field("room").parse::<Room>()) else {
                    return GatewayReply::failure("Invalid grade or room");
                };
                if field("fileData").is_empty() {
                    return GatewayReply::failure("Missing file");
                }
                let row_id = state.next_row_id;
                state.next_row_id += 1;
                state.records.push(SubmissionRecord {
                    row_id: Some(row_id),
                    timestamp: Some("2025-01-02T10:20:30Z".to_string()),
                    name: field("name").to_string(),
                    student_number: field("studentNumber").to_string(),
                    grade,
                    room,
                    file_url: Some(format!("https://drive.example.com/v/{row_id}")),
                    review: None,
                    reactions: None,
                });
                GatewayReply { success: true, message: Some("Uploaded".to_string()), ..GatewayReply::default() }
            }
            Action::Grade => {
                let row_id = data.get("rowId").and_then(Value::as_i64);
                let review = serde_json::from_value::<RubricReview>(data.clone());
                match (row_id, review) {
                    (Some(row_id), Ok(review)) => {
                        match state.records.iter_mut().find(|record| record.row_id == Some(row_id)) {
                            Some(record) => {
                                record.review = Some(review);
                                GatewayReply::ok(None)
                            }
                            None => GatewayReply::failure("Row not found"),
                        }
                    }
                    _ => GatewayReply::failure("Invalid grade payload"),
                }
            }
            Action::Login => {
                let user = data.get("username").and_then(Value::as_str);
                let pin = data.get("pin").and_then(Value::as_str);
                if user == Some(TEACHER_USER) && pin == Some(TEACHER_PIN) {
                    GatewayReply {
                        success: true,
                        teacher_name: Some(TEACHER_NAME.to_string()),
                        ..GatewayReply::default()
                    }
                } else {
                    GatewayReply::failure("Wrong username or PIN")
                }
            }
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn call(&self, action: Action, data: Value) -> Result<GatewayReply, TransportError> {
        self.calls.lock().expect("calls lock").push((action, data.clone()));
        let reply = self.handle(action, &data);
        let gate = self.gate.lock().expect("gate lock").take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(reply)
    }
}

type Handler = Box<dyn Fn(Action, &Value) -> Result<GatewayReply, TransportError> + Send + Sync>;

/// Gateway whose replies come from a swappable closure.
pub(crate) struct ScriptedGateway {
    handler: Mutex<Handler>,
    calls: Mutex<Vec<(Action, Value)>>,
}

impl ScriptedGateway {
    pub(crate) fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(Action, &Value) -> Result<GatewayReply, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self { handler: Mutex::new(Box::new(handler)), calls: Mutex::new(Vec::new()) })
    }

    pub(crate) fn set_handler<F>(&self, handler: F)
    where
        F: Fn(Action, &Value) -> Result<GatewayReply, TransportError> + Send + Sync + 'static,
    {
        *self.handler.lock().expect("handler lock") = Box::new(handler);
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn call(&self, action: Action, data: Value) -> Result<GatewayReply, TransportError> {
        let result = (self.handler.lock().expect("handler lock"))(action, &data);
        self.calls.lock().expect("calls lock").push((action, data));
        result
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    notifications: Mutex<Vec<(String, String)>>,
    celebrations: Mutex<HashMap<String, usize>>,
}

impl RecordingNotifier {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn notifications(&self) -> Vec<(String, String)> {
        self.notifications.lock().expect("notifications lock").clone()
    }

    pub(crate) fn celebrations(&self, student_name: &str) -> usize {
        self.celebrations.lock().expect("celebrations lock").get(student_name).copied().unwrap_or(0)
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, title: &str, body: &str) {
        self.notifications
            .lock()
            .expect("notifications lock")
            .push((title.to_string(), body.to_string()));
    }

    fn celebrate(&self, student_name: &str) {
        *self
            .celebrations
            .lock()
            .expect("celebrations lock")
            .entry(student_name.to_string())
            .or_default() += 1;
    }
}

pub(crate) struct TestContext {
    pub(crate) state: AppState,
    pub(crate) gateway: Arc<MemoryGateway>,
    pub(crate) notifier: Arc<RecordingNotifier>,
}

pub(crate) fn setup_test_context(records: Vec<SubmissionRecord>) -> TestContext {
    let gateway = MemoryGateway::with_records(records);
    let notifier = RecordingNotifier::new();
    let settings = Settings::for_gateway("http://gateway.invalid/exec")
        .with_max_upload_size_mb(1)
        .with_poll_interval_seconds(1);
    let state = AppState::with_parts(settings, gateway.clone(), notifier.clone())
        .expect("app state");
    TestContext { state, gateway, notifier }
}
