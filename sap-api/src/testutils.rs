use async_trait::async_trait;
use serde_json::{Value, json};
use shared::rabbitmq::{InboundMessage, Outputter, PublishError, RabbitmqError, decode_body};
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

#[derive(Default)]
enum Mode {
    #[default]
    Record,
    Fail,
    Panic,
}

/// Outputter that keeps every payload in memory instead of publishing it.
#[derive(Default)]
pub struct RecordingOutputter {
    sent: Mutex<Vec<(String, Value)>>,
    mode: Mode,
}

impl RecordingOutputter {
    pub fn failing() -> Self {
        RecordingOutputter {
            mode: Mode::Fail,
            ..Default::default()
        }
    }

    pub fn panicking() -> Self {
        RecordingOutputter {
            mode: Mode::Panic,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<(String, Value)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Outputter for RecordingOutputter {
    async fn send(&self, queue: &str, payload: Value) -> Result<(), PublishError> {
        match self.mode {
            Mode::Record => {
                self.sent.lock().unwrap().push((queue.to_string(), payload));
                Ok(())
            }
            Mode::Fail => Err(PublishError::Rejected {
                queue: queue.to_string(),
            }),
            Mode::Panic => panic!("outputter exploded"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    Success,
    Fail { requeue: bool },
}

/// Inbound message that records how it was acknowledged.
pub struct RecordingMessage {
    body: Vec<u8>,
    acks: Arc<Mutex<Vec<Ack>>>,
}

impl RecordingMessage {
    pub fn new(body: Vec<u8>) -> Self {
        RecordingMessage {
            body,
            acks: Arc::default(),
        }
    }

    pub fn json(value: &Value) -> Self {
        Self::new(serde_json::to_vec(value).unwrap())
    }

    pub fn acks(&self) -> Vec<Ack> {
        self.acks.lock().unwrap().clone()
    }

    /// Handle that outlives the message once it is moved into a stream.
    pub fn ack_log(&self) -> Arc<Mutex<Vec<Ack>>> {
        self.acks.clone()
    }
}

#[async_trait]
impl InboundMessage for RecordingMessage {
    fn data(&self) -> Result<Value, RabbitmqError> {
        decode_body(&self.body)
    }

    async fn success(&self) -> Result<(), RabbitmqError> {
        self.acks.lock().unwrap().push(Ack::Success);
        Ok(())
    }

    async fn fail(&self, requeue: bool) -> Result<(), RabbitmqError> {
        self.acks.lock().unwrap().push(Ack::Fail { requeue });
        Ok(())
    }
}

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// The first line containing `needle`, if any.
    pub fn line_with(&self, needle: &str) -> Option<String> {
        self.contents()
            .lines()
            .find(|line| line.contains(needle))
            .map(str::to_string)
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

pub fn business_user_envelope(count: usize, role_assignment_url: &str) -> Value {
    let results: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "ObjectID": format!("BU{i}"),
                "EmployeeID": "E1",
                "UserID": "U1",
                "UserLockedIndicator": false,
                "UserValidityEndDate": null,
                "BusinessUserBusinessRoleAssignment": {
                    "__deferred": {"uri": role_assignment_url}
                }
            })
        })
        .collect();
    json!({"d": {"results": results}})
}

pub fn role_envelope(count: usize) -> Value {
    let results: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "ObjectID": format!("ROLE{i}"),
                "ParentObjectID": "BU0",
                "EmployeeID": "E1",
                "UserID": "U1",
                "BusinessRoleID": format!("ROLE_{i}")
            })
        })
        .collect();
    json!({"d": {"results": results}})
}

pub fn employee_envelope(count: usize) -> Value {
    let results: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "__metadata": {"type": "c4codata.EmployeeBasicData"},
                "ObjectID": format!("EMP{i}"),
                "EmployeeID": "E1",
                "UserID": "U1",
                "FirstName": "Jane",
                "LastName": "Doe",
                "CurrentInternalEmployeeIndicator": true
            })
        })
        .collect();
    json!({"d": {"results": results}})
}
