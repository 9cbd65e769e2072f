use crate::decoder::PayloadDecoder;
use crate::domain::{ErrorReport, LogLevel, QueueMessage};
use crate::sender::ErrorReportTransport;
use crate::translator::ErrorReportTranslator;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, warn};

/// Entries below this level are acknowledged without being reported.
pub const WARNING_THRESHOLD: LogLevel = LogLevel::WARNING;

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Terminal state of one message's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Transport completed within the deadline, whatever its own result.
    Delivered,
    /// Entry below the warning threshold; nothing was sent.
    ShortCircuited,
    DecodeFailed,
    TimedOut,
    /// A panic or task failure somewhere in the pipeline.
    Failed,
}

impl DeliveryOutcome {
    /// `true` means acknowledge, `false` means requeue.
    pub fn is_handled(self) -> bool {
        matches!(self, Self::Delivered | Self::ShortCircuited)
    }
}

/// Runs decode → filter → translate → send for one message at a time.
pub struct DeliveryCoordinator<T> {
    decoder: PayloadDecoder,
    translator: ErrorReportTranslator,
    transport: Arc<T>,
    send_timeout: Duration,
}

impl<T> Clone for DeliveryCoordinator<T> {
    fn clone(&self) -> Self {
        Self {
            decoder: self.decoder.clone(),
            translator: self.translator,
            transport: Arc::clone(&self.transport),
            send_timeout: self.send_timeout,
        }
    }
}

impl<T> DeliveryCoordinator<T>
where
    T: ErrorReportTransport + 'static,
{
    pub fn new(translator: ErrorReportTranslator, transport: Arc<T>) -> Self {
        Self {
            decoder: PayloadDecoder::new(),
            translator,
            transport,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    /// Queue-facing entry point: `true` acknowledges, `false` requeues.
    pub async fn handle(&self, message: &QueueMessage) -> bool {
        self.process(message).await.is_handled()
    }

    pub async fn process(&self, message: &QueueMessage) -> DeliveryOutcome {
        let entry = match self.decoder.decode(message) {
            Ok(entry) => entry,
            Err(e) => {
                error!(error = %e, bytes = message.body.len(), "Failed to decode log entry");
                return DeliveryOutcome::DecodeFailed;
            }
        };

        if entry.level < WARNING_THRESHOLD {
            debug!(entry_id = %entry.id, level = %entry.level, "Below warning level, skipping");
            return DeliveryOutcome::ShortCircuited;
        }

        let translated =
            panic::catch_unwind(AssertUnwindSafe(|| self.translator.translate(&entry)));
        let report = match translated {
            Ok(report) => report,
            Err(payload) => {
                error!(
                    entry_id = %entry.id,
                    panic = panic_message(payload.as_ref()),
                    "Translation panicked"
                );
                return DeliveryOutcome::Failed;
            }
        };

        self.send_with_deadline(report, &entry.id).await
    }

    /// Races the transport against the deadline. On expiry the send task is aborted
    /// and never awaited again.
    async fn send_with_deadline(&self, report: ErrorReport, entry_id: &str) -> DeliveryOutcome {
        let transport = Arc::clone(&self.transport);
        let mut send_task = tokio::spawn(async move { transport.send(&report).await });

        match timeout(self.send_timeout, &mut send_task).await {
            Ok(Ok(Ok(()))) => {
                debug!(entry_id, "Error report delivered");
                DeliveryOutcome::Delivered
            }
            Ok(Ok(Err(e))) => {
                warn!(entry_id, error = %e, "Error report transport failed, acknowledging anyway");
                DeliveryOutcome::Delivered
            }
            Ok(Err(join_error)) => {
                error!(entry_id, error = %join_error, "Error report delivery task failed");
                DeliveryOutcome::Failed
            }
            Err(_) => {
                send_task.abort();
                warn!(
                    entry_id,
                    timeout_secs = self.send_timeout.as_secs(),
                    "Sending timeout exceeded, message will be requeued"
                );
                DeliveryOutcome::TimedOut
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::TransportError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    #[derive(Default)]
    struct MockTransport {
        sent: Mutex<Vec<ErrorReport>>,
        calls: AtomicUsize,
        fail: bool,
        hang: bool,
    }

    impl ErrorReportTransport for MockTransport {
        async fn send(&self, report: &ErrorReport) -> Result<(), TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if self.fail {
                return Err(TransportError::HttpStatus {
                    status: 500,
                    message: "down".to_string(),
                });
            }
            self.sent.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn coordinator(transport: MockTransport) -> (DeliveryCoordinator<MockTransport>, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let coordinator =
            DeliveryCoordinator::new(ErrorReportTranslator::new(LogLevel::ERROR), Arc::clone(&transport));
        (coordinator, transport)
    }

    fn message(level: i32) -> QueueMessage {
        QueueMessage::new(format!(
            r#"{{"id":"e-1","level":{level},"serviceId":"billing","messages":[{{"message":"boom","level":{level}}}]}}"#
        ))
    }

    #[tokio::test]
    async fn test_error_entry_is_delivered_and_acknowledged() {
        let (coordinator, transport) = coordinator(MockTransport::default());

        assert!(coordinator.handle(&message(3)).await);

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].error.message, "billing boom");
    }

    #[tokio::test]
    async fn test_below_warning_is_acknowledged_without_sending() {
        let (coordinator, transport) = coordinator(MockTransport::default());

        assert_eq!(coordinator.process(&message(1)).await, DeliveryOutcome::ShortCircuited);
        assert!(coordinator.handle(&message(0)).await);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_still_acknowledges() {
        let (coordinator, transport) = coordinator(MockTransport {
            fail: true,
            ..Default::default()
        });

        assert_eq!(coordinator.process(&message(2)).await, DeliveryOutcome::Delivered);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_decode_failure_requeues() {
        let (coordinator, transport) = coordinator(MockTransport::default());
        let garbage = QueueMessage::new("not json").with_header("Content-Encoding", "gzip");

        assert_eq!(coordinator.process(&garbage).await, DeliveryOutcome::DecodeFailed);
        assert!(!coordinator.handle(&QueueMessage::new("{}")).await);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    #[traced_test]
    async fn test_hanging_transport_times_out() {
        let (coordinator, transport) = coordinator(MockTransport {
            hang: true,
            ..Default::default()
        });

        assert_eq!(coordinator.send_timeout(), Duration::from_secs(60));
        assert_eq!(coordinator.process(&message(4)).await, DeliveryOutcome::TimedOut);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
        assert!(logs_contain("Sending timeout exceeded"));
    }

    #[test]
    fn test_outcome_mapping() {
        assert!(DeliveryOutcome::Delivered.is_handled());
        assert!(DeliveryOutcome::ShortCircuited.is_handled());
        assert!(!DeliveryOutcome::DecodeFailed.is_handled());
        assert!(!DeliveryOutcome::TimedOut.is_handled());
        assert!(!DeliveryOutcome::Failed.is_handled());
    }
}
