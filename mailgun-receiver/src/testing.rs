//! Recording collaborators for tests.

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::Subscriber;

use crate::collab::{AlertSink, MailProcessor, NotificationSender};
use crate::ingest::ProcessingError;
use crate::queue::{OperatorAlert, RejectionNotice};

pub const SAMPLE_MIME: &str = "From: Jane Doe <jane@example.com>\r\n\
To: reply+abc123@forum.example.com\r\n\
Subject: Weekly meetup\r\n\
Content-Type: text/plain\r\n\
\r\n\
Count me in.\r\n";

type Script = Box<dyn Fn() -> Result<(), ProcessingError> + Send + Sync>;

/// Processor that records every call and answers from a script.
pub struct ScriptedProcessor {
    script: Script,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProcessor {
    pub fn succeeding() -> Self {
        Self {
            script: Box::new(|| Ok(())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing<F>(error: F) -> Self
    where
        F: Fn() -> ProcessingError + Send + Sync + 'static,
    {
        Self {
            script: Box::new(move || Err(error())),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailProcessor for ScriptedProcessor {
    async fn process(&self, raw_mime: &str) -> Result<(), ProcessingError> {
        self.calls.lock().unwrap().push(raw_mime.to_string());
        (self.script)()
    }
}

/// Sender that keeps delivered notices in memory.
#[derive(Default)]
pub struct RecordingSender {
    fail: bool,
    notices: Mutex<Vec<RejectionNotice>>,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            fail: true,
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn notices(&self) -> Vec<RejectionNotice> {
        self.notices.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn deliver(&self, notice: RejectionNotice) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("mailer unavailable");
        }
        self.notices.lock().unwrap().push(notice);
        Ok(())
    }
}

/// Alert sink that keeps reported alerts in memory.
#[derive(Default)]
pub struct RecordingAlertSink {
    alerts: Mutex<Vec<OperatorAlert>>,
}

impl RecordingAlertSink {
    pub fn alerts(&self) -> Vec<OperatorAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingAlertSink {
    async fn report(&self, error: &anyhow::Error, context: &BTreeMap<String, String>) {
        self.alerts.lock().unwrap().push(OperatorAlert {
            error: format!("{:#}", error),
            context: context.clone(),
        });
    }
}

/// Sender whose delivery never completes, like a broker that stopped answering.
pub struct StalledSender;

#[async_trait]
impl NotificationSender for StalledSender {
    async fn deliver(&self, _notice: RejectionNotice) -> anyhow::Result<()> {
        std::future::pending::<anyhow::Result<()>>().await
    }
}

/// Alert sink whose report never completes.
pub struct StalledAlertSink;

#[async_trait]
impl AlertSink for StalledAlertSink {
    async fn report(&self, _error: &anyhow::Error, _context: &BTreeMap<String, String>) {
        std::future::pending::<()>().await
    }
}

/// In-memory log output for asserting on emitted events.
///
/// Install with `tracing::subscriber::set_default(logs.subscriber())` for the
/// duration of a current-thread test.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    pub fn subscriber(&self) -> impl Subscriber + Send + Sync {
        let logs = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
