//! Integration tests for the mailer.
//!
//! These tests use a scripted transport double and an in-memory
//! repository so delivery, queueing, and redrive behavior can be
//! exercised without any real transport.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mailwright::render::{Language, MailComponent, Node, PrepareError};
use mailwright::{
    DispatchError, DkimConfig, Error, MailRepository, Mailer, RenderedMail, SendableMail,
    StoreError, TransportPayload,
};

/// Transport double that fails a scripted number of dispatches before
/// succeeding, recording every payload it sees.
#[derive(Clone, Default)]
struct ScriptedTransport {
    state: Arc<TransportState>,
}

#[derive(Default)]
struct TransportState {
    failures_remaining: Mutex<u32>,
    dispatched: Mutex<Vec<TransportPayload>>,
}

impl ScriptedTransport {
    fn failing(count: u32) -> Self {
        let transport = Self::default();
        *transport.state.failures_remaining.lock().unwrap() = count;
        transport
    }

    fn succeed_from_now_on(&self) {
        *self.state.failures_remaining.lock().unwrap() = 0;
    }

    fn dispatch_count(&self) -> usize {
        self.state.dispatched.lock().unwrap().len()
    }

    fn dispatched(&self) -> Vec<TransportPayload> {
        self.state.dispatched.lock().unwrap().clone()
    }
}

impl mailwright::Transport for ScriptedTransport {
    async fn dispatch(&self, payload: TransportPayload) -> Result<(), DispatchError> {
        self.state.dispatched.lock().unwrap().push(payload);

        let mut failures = self.state.failures_remaining.lock().unwrap();
        if *failures > 0 {
            *failures -= 1;
            return Err("transport rejected".into());
        }
        Ok(())
    }
}

/// Caller-owned stored mail record.
#[derive(Debug, Clone)]
struct StoredRecord {
    id: u64,
    subject: String,
    text: String,
    html: String,
    recipients: Vec<String>,
}

/// In-memory repository recording hook invocations.
#[derive(Clone, Default)]
struct MemoryRepository {
    state: Arc<RepositoryState>,
}

#[derive(Default)]
struct RepositoryState {
    next_id: Mutex<u64>,
    reject_create: Mutex<bool>,
    sent: Mutex<Vec<u64>>,
    errors: Mutex<Vec<(u64, String)>>,
}

impl MemoryRepository {
    fn rejecting_create() -> Self {
        let repository = Self::default();
        *repository.state.reject_create.lock().unwrap() = true;
        repository
    }

    fn sent_ids(&self) -> Vec<u64> {
        self.state.sent.lock().unwrap().clone()
    }

    fn error_count(&self) -> usize {
        self.state.errors.lock().unwrap().len()
    }
}

impl MailRepository for MemoryRepository {
    type Stored = StoredRecord;

    async fn create(
        &self,
        recipients: &[String],
        mail: &RenderedMail,
    ) -> Result<StoredRecord, StoreError> {
        if *self.state.reject_create.lock().unwrap() {
            return Err("storage unavailable".into());
        }

        let mut next_id = self.state.next_id.lock().unwrap();
        *next_id += 1;

        Ok(StoredRecord {
            id: *next_id,
            subject: mail.subject.clone(),
            text: mail.text.clone(),
            html: mail.html.clone(),
            recipients: recipients.to_vec(),
        })
    }

    fn to_sendable(&self, stored: &StoredRecord) -> SendableMail {
        SendableMail {
            subject: stored.subject.clone(),
            text: stored.text.clone(),
            html: stored.html.clone(),
            recipients: stored.recipients.clone(),
        }
    }

    async fn mark_sent(&self, stored: &StoredRecord) {
        self.state.sent.lock().unwrap().push(stored.id);
    }

    async fn on_send_error(&self, stored: &StoredRecord, _mail: &SendableMail, error: &Error) {
        self.state
            .errors
            .lock()
            .unwrap()
            .push((stored.id, error.to_string()));
    }
}

struct Welcome;

impl MailComponent for Welcome {
    fn subject(&self) -> String {
        "Welcome".to_string()
    }

    fn render(&self, language: &Language) -> Node {
        Node::new("div").child(language.pick("Hi", &[("de", "Hallo")]))
    }
}

struct BrokenPrepare;

impl MailComponent for BrokenPrepare {
    fn subject(&self) -> String {
        "Broken".to_string()
    }

    async fn prepare(&mut self) -> Result<(), PrepareError> {
        Err("profile fetch failed".into())
    }

    fn render(&self, _language: &Language) -> Node {
        Node::new("div").child("never rendered")
    }
}

fn recipients() -> Vec<String> {
    vec!["user@example.test".to_string()]
}

/// Routes tracing output through the test harness capture.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

#[tokio::test]
async fn test_send_renders_and_dispatches() {
    init_tracing();
    let transport = ScriptedTransport::default();
    let repository = MemoryRepository::default();
    let mailer = Mailer::new(repository.clone(), transport.clone(), "noreply@example.test");

    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap();

    let dispatched = transport.dispatched();
    assert_eq!(dispatched.len(), 1);
    assert_eq!(dispatched[0].from, "noreply@example.test");
    assert_eq!(dispatched[0].to, recipients());
    assert_eq!(dispatched[0].subject, "Welcome");
    assert_eq!(dispatched[0].text, "Hi");
    assert_eq!(dispatched[0].html, "<div>Hi</div>");
    assert!(dispatched[0].dkim.is_none());

    assert_eq!(repository.sent_ids(), vec![1]);
    assert_eq!(mailer.queued().await, 0);
}

#[tokio::test]
async fn test_send_threads_language_into_render() {
    init_tracing();
    let transport = ScriptedTransport::default();
    let mailer = Mailer::new(
        MemoryRepository::default(),
        transport.clone(),
        "noreply@example.test",
    );

    mailer
        .send(&mut Welcome, recipients(), &Language::new("de"))
        .await
        .unwrap();

    assert_eq!(transport.dispatched()[0].text, "Hallo");
    assert_eq!(transport.dispatched()[0].html, "<div>Hallo</div>");
}

#[tokio::test]
async fn test_dkim_parameters_are_attached_to_payload() {
    init_tracing();
    let transport = ScriptedTransport::default();
    let mailer = Mailer::builder(
        MemoryRepository::default(),
        transport.clone(),
        "noreply@example.test",
    )
    .dkim(DkimConfig::new("example.test", "private-key"))
    .build();

    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap();

    let dkim = transport.dispatched()[0].dkim.clone().unwrap();
    assert_eq!(dkim.domain_name, "example.test");
    assert_eq!(dkim.key_selector, "default");
}

#[tokio::test]
async fn test_failed_dispatch_queues_mail_and_surfaces_error() {
    init_tracing();
    let transport = ScriptedTransport::failing(1);
    let repository = MemoryRepository::default();
    let mailer = Mailer::new(repository.clone(), transport.clone(), "noreply@example.test");

    let result = mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await;

    assert!(matches!(result, Err(Error::Dispatch(_))));
    assert_eq!(mailer.queued().await, 1);
    assert_eq!(repository.error_count(), 1);
    assert!(repository.sent_ids().is_empty());
}

#[tokio::test]
async fn test_resend_delivers_queued_mail_and_fires_success_hook_once() {
    init_tracing();
    let transport = ScriptedTransport::failing(1);
    let repository = MemoryRepository::default();
    let mailer = Mailer::new(repository.clone(), transport.clone(), "noreply@example.test");

    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap_err();
    assert_eq!(mailer.queued().await, 1);

    transport.succeed_from_now_on();
    mailer.resend().await;

    assert_eq!(mailer.queued().await, 0);
    assert_eq!(repository.sent_ids(), vec![1]);
    assert_eq!(transport.dispatch_count(), 2);
}

#[tokio::test]
async fn test_resend_preserves_fifo_order() {
    init_tracing();
    let transport = ScriptedTransport::failing(2);
    let repository = MemoryRepository::default();
    let mailer = Mailer::new(repository.clone(), transport.clone(), "noreply@example.test");

    struct Numbered(u32);

    impl MailComponent for Numbered {
        fn subject(&self) -> String {
            format!("Mail {}", self.0)
        }

        fn render(&self, _language: &Language) -> Node {
            Node::new("div").child(i64::from(self.0))
        }
    }

    mailer
        .send(&mut Numbered(1), recipients(), &Language::new("en"))
        .await
        .unwrap_err();
    mailer
        .send(&mut Numbered(2), recipients(), &Language::new("en"))
        .await
        .unwrap_err();
    assert_eq!(mailer.queued().await, 2);

    mailer.resend().await;

    assert_eq!(mailer.queued().await, 0);
    assert_eq!(repository.sent_ids(), vec![1, 2]);

    let redriven: Vec<String> = transport.dispatched()[2..]
        .iter()
        .map(|payload| payload.subject.clone())
        .collect();
    assert_eq!(redriven, vec!["Mail 1", "Mail 2"]);
}

#[tokio::test]
async fn test_resend_pass_is_bounded_by_starting_length() {
    init_tracing();
    // An entry requeued by this pass's own failure must wait for the
    // next pass.
    let transport = ScriptedTransport::failing(u32::MAX);
    let repository = MemoryRepository::default();
    let mailer = Mailer::new(repository.clone(), transport.clone(), "noreply@example.test");

    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap_err();
    assert_eq!(transport.dispatch_count(), 1);

    mailer.resend().await;

    assert_eq!(transport.dispatch_count(), 2);
    assert_eq!(mailer.queued().await, 1);

    // The next pass picks the requeued entry up again.
    mailer.resend().await;
    assert_eq!(transport.dispatch_count(), 3);
    assert_eq!(mailer.queued().await, 1);
}

#[tokio::test]
async fn test_resend_swallows_errors_and_processes_whole_queue() {
    init_tracing();
    let transport = ScriptedTransport::failing(3);
    let repository = MemoryRepository::default();
    let mailer = Mailer::new(repository.clone(), transport.clone(), "noreply@example.test");

    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap_err();
    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap_err();

    // First queued mail fails once more during the pass, the second
    // succeeds; the pass itself never errors.
    mailer.resend().await;

    assert_eq!(mailer.queued().await, 1);
    assert_eq!(repository.sent_ids(), vec![2]);
}

#[tokio::test]
async fn test_resend_on_empty_queue_is_a_noop() {
    init_tracing();
    let transport = ScriptedTransport::default();
    let mailer = Mailer::new(
        MemoryRepository::default(),
        transport.clone(),
        "noreply@example.test",
    );

    mailer.resend().await;
    assert_eq!(transport.dispatch_count(), 0);
}

#[tokio::test]
async fn test_preparation_failure_creates_nothing() {
    init_tracing();
    let transport = ScriptedTransport::default();
    let repository = MemoryRepository::default();
    let mailer = Mailer::new(repository.clone(), transport.clone(), "noreply@example.test");

    let result = mailer
        .send(&mut BrokenPrepare, recipients(), &Language::new("en"))
        .await;

    assert!(matches!(result, Err(Error::Preparation(_))));
    assert_eq!(transport.dispatch_count(), 0);
    assert_eq!(mailer.queued().await, 0);
    assert_eq!(repository.error_count(), 0);
}

#[tokio::test]
async fn test_store_failure_is_surfaced_and_nothing_is_queued() {
    init_tracing();
    let transport = ScriptedTransport::default();
    let mailer = Mailer::new(
        MemoryRepository::rejecting_create(),
        transport.clone(),
        "noreply@example.test",
    );

    let result = mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await;

    assert!(matches!(result, Err(Error::Store(_))));
    assert_eq!(transport.dispatch_count(), 0);
    assert_eq!(mailer.queued().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_redrive_timer_redrives_after_interval() {
    init_tracing();
    let transport = ScriptedTransport::failing(1);
    let repository = MemoryRepository::default();
    let mailer = Mailer::builder(repository.clone(), transport.clone(), "noreply@example.test")
        .redrive_interval(Duration::from_secs(300))
        .build();

    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap_err();

    let redrive = mailer.start_redrive();

    // The paused clock advances past the interval; the timer fires and
    // the pass completes before this sleep resolves.
    tokio::time::sleep(Duration::from_secs(301)).await;

    assert_eq!(mailer.queued().await, 0);
    assert_eq!(repository.sent_ids(), vec![1]);

    redrive.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stopped_redrive_timer_runs_no_further_passes() {
    init_tracing();
    let transport = ScriptedTransport::failing(u32::MAX);
    let mailer = Mailer::builder(
        MemoryRepository::default(),
        transport.clone(),
        "noreply@example.test",
    )
    .redrive_interval(Duration::from_secs(300))
    .build();

    mailer
        .send(&mut Welcome, recipients(), &Language::new("en"))
        .await
        .unwrap_err();

    let redrive = mailer.start_redrive();
    redrive.stop().await;

    tokio::time::sleep(Duration::from_secs(3600)).await;

    // Only the original dispatch happened; the timer never fired.
    assert_eq!(transport.dispatch_count(), 1);
    assert_eq!(mailer.queued().await, 1);
}
