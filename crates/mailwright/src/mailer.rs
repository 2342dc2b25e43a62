//! Mail sending orchestration and the redrive timer.
//!
//! [`Mailer`] ties the pieces together: it prepares and renders a
//! component, hands the result to the caller's [`MailRepository`]
//! factory, dispatches through the injected [`Transport`], and retains
//! anything unconfirmed in the [`DeliveryQueue`] until a redrive pass
//! gets it through.
//!
//! Per-mail state machine: Created (factory) → Rendered → Dispatched →
//! Confirmed, or on failure → Pending-Redrive at the queue tail →
//! Dispatched again on the next pass.

use std::sync::Arc;
use std::time::Duration;

use mailwright_render::{Language, MailComponent};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::queue::{DeliveryQueue, QueuedMail};
use crate::repository::{MailRepository, RenderedMail, SendableMail};
use crate::transport::{DkimConfig, Transport, TransportPayload};

/// Default delay between redrive passes.
pub const DEFAULT_REDRIVE_INTERVAL: Duration = Duration::from_secs(5 * 60);

struct Inner<R: MailRepository, T> {
    repository: R,
    transport: T,
    sender_email: String,
    dkim: Option<DkimConfig>,
    redrive_interval: Duration,
    queue: DeliveryQueue<R::Stored>,
}

/// Configures and builds a [`Mailer`].
#[must_use]
pub struct MailerBuilder<R: MailRepository, T> {
    repository: R,
    transport: T,
    sender_email: String,
    dkim: Option<DkimConfig>,
    redrive_interval: Duration,
}

impl<R: MailRepository, T: Transport> MailerBuilder<R, T> {
    /// Attaches DKIM signing parameters to every outgoing payload.
    pub fn dkim(mut self, dkim: DkimConfig) -> Self {
        self.dkim = Some(dkim);
        self
    }

    /// Overrides the delay between redrive passes (default 5 minutes).
    pub fn redrive_interval(mut self, interval: Duration) -> Self {
        self.redrive_interval = interval;
        self
    }

    /// Builds the mailer.
    pub fn build(self) -> Mailer<R, T> {
        Mailer {
            inner: Arc::new(Inner {
                repository: self.repository,
                transport: self.transport,
                sender_email: self.sender_email,
                dkim: self.dkim,
                redrive_interval: self.redrive_interval,
                queue: DeliveryQueue::new(),
            }),
        }
    }
}

/// Sends rendered mail through an injected transport with
/// at-least-once delivery semantics.
///
/// Cloning is cheap and shares the delivery queue; the redrive task
/// holds a clone for the lifetime of its timer.
pub struct Mailer<R: MailRepository, T: Transport> {
    inner: Arc<Inner<R, T>>,
}

impl<R: MailRepository, T: Transport> Clone for Mailer<R, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, T> Mailer<R, T>
where
    R: MailRepository + 'static,
    T: Transport + 'static,
{
    /// Starts configuring a mailer.
    pub fn builder(
        repository: R,
        transport: T,
        sender_email: impl Into<String>,
    ) -> MailerBuilder<R, T> {
        MailerBuilder {
            repository,
            transport,
            sender_email: sender_email.into(),
            dkim: None,
            redrive_interval: DEFAULT_REDRIVE_INTERVAL,
        }
    }

    /// Creates a mailer with default settings.
    #[must_use]
    pub fn new(repository: R, transport: T, sender_email: impl Into<String>) -> Self {
        Self::builder(repository, transport, sender_email).build()
    }

    /// Prepares, renders, stores, and dispatches one component.
    ///
    /// Preparation is awaited exactly once; rendering happens
    /// immediately afterwards with the language threaded explicitly,
    /// so concurrent sends in different languages cannot interfere.
    ///
    /// # Errors
    ///
    /// [`Error::Preparation`] and [`Error::Store`] mean nothing was
    /// created or queued. [`Error::Dispatch`] means the mail is
    /// retained in the delivery queue and will be redriven.
    pub async fn send<C: MailComponent>(
        &self,
        component: &mut C,
        recipients: Vec<String>,
        language: &Language,
    ) -> Result<()> {
        component.prepare().await.map_err(Error::Preparation)?;

        let tree = component.render(language);
        let rendered = RenderedMail {
            subject: component.subject(),
            text: tree.plain_text(),
            html: tree.markup(),
        };

        tracing::debug!(
            subject = %rendered.subject,
            recipients = ?recipients,
            language = %language,
            "mail rendered"
        );

        let stored = self
            .inner
            .repository
            .create(&recipients, &rendered)
            .await
            .map_err(Error::Store)?;

        self.push(stored).await
    }

    /// Dispatches one stored mail, queueing it on failure.
    ///
    /// The transport is invoked exactly once. On success the
    /// repository's success hook fires; on failure the error hook
    /// fires, the mail is appended at the queue tail, and the error is
    /// surfaced to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Dispatch`] when the transport rejects the
    /// payload.
    pub async fn push(&self, stored: R::Stored) -> Result<()> {
        match self.dispatch_stored(&stored).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.inner.queue.push_back(QueuedMail::new(stored)).await;
                Err(error)
            }
        }
    }

    /// Runs one redrive pass over the delivery queue.
    ///
    /// The pass is bounded by the queue length at its start, so
    /// entries requeued by this pass's own failures wait for the next
    /// pass. Dispatch errors are logged and swallowed here; one
    /// failing mail never blocks the rest of the queue.
    pub async fn resend(&self) {
        let pass_len = self.inner.queue.len().await;
        if pass_len == 0 {
            return;
        }

        tracing::debug!(queued = pass_len, "redrive pass started");

        let mut delivered = 0_usize;
        for _ in 0..pass_len {
            let Some(entry) = self.inner.queue.pop_front().await else {
                break;
            };

            match self.dispatch_stored(&entry.mail).await {
                Ok(()) => delivered += 1,
                Err(error) => {
                    let entry = entry.retried();
                    tracing::warn!(
                        attempts = entry.attempts,
                        queued_at = %entry.queued_at,
                        error = %error,
                        "redrive attempt failed, mail requeued"
                    );
                    self.inner.queue.push_back(entry).await;
                }
            }
        }

        tracing::debug!(delivered, "redrive pass finished");
    }

    /// Number of mails currently awaiting redrive.
    pub async fn queued(&self) -> usize {
        self.inner.queue.len().await
    }

    /// Starts the background redrive timer.
    ///
    /// The timer sleeps for the configured interval, runs one
    /// [`resend`](Self::resend) pass to completion, and only then
    /// starts the next interval. The delay is measured from the end
    /// of one pass to the start of the next, so passes never overlap.
    ///
    /// The returned handle stops the loop; dropping it aborts the task
    /// instead.
    #[must_use]
    pub fn start_redrive(&self) -> RedriveHandle
    where
        R::Stored: Sync,
    {
        let mailer = self.clone();
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tokio::time::sleep(mailer.inner.redrive_interval) => {}
                    _ = &mut stop_rx => break,
                }
                mailer.resend().await;
            }
            tracing::debug!("redrive timer stopped");
        });

        RedriveHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }

    /// Converts, addresses, and dispatches one stored mail, firing the
    /// repository hooks. Queue handling stays with the callers.
    async fn dispatch_stored(&self, stored: &R::Stored) -> Result<()> {
        let sendable = self.inner.repository.to_sendable(stored);
        let payload = self.payload_for(&sendable);

        match self.inner.transport.dispatch(payload).await {
            Ok(()) => {
                tracing::debug!(subject = %sendable.subject, "mail dispatched");
                self.inner.repository.mark_sent(stored).await;
                Ok(())
            }
            Err(source) => {
                let error = Error::Dispatch(source);
                self.inner
                    .repository
                    .on_send_error(stored, &sendable, &error)
                    .await;
                Err(error)
            }
        }
    }

    fn payload_for(&self, mail: &SendableMail) -> TransportPayload {
        TransportPayload {
            from: self.inner.sender_email.clone(),
            to: mail.recipients.clone(),
            subject: mail.subject.clone(),
            text: mail.text.clone(),
            html: mail.html.clone(),
            dkim: self.inner.dkim.clone(),
        }
    }
}

/// Handle controlling a running redrive timer.
///
/// Call [`stop`](Self::stop) for a clean shutdown that lets an
/// in-flight pass finish. Dropping the handle aborts the task at its
/// next await point instead.
#[derive(Debug)]
pub struct RedriveHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl RedriveHandle {
    /// Signals the timer to stop and waits for the loop to exit.
    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for RedriveHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
