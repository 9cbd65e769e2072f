use super::coordinator::DeliveryCoordinator;
use crate::domain::QueueMessage;
use crate::sender::ErrorReportTransport;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A queue message paired with the channel its outcome is reported on.
///
/// Dropping a delivery without completing it reads as a requeue on the queue side.
#[derive(Debug)]
pub struct Delivery {
    pub message: QueueMessage,
    outcome_tx: oneshot::Sender<bool>,
}

impl Delivery {
    pub fn new(message: QueueMessage) -> (Self, oneshot::Receiver<bool>) {
        let (outcome_tx, outcome_rx) = oneshot::channel();
        (Self { message, outcome_tx }, outcome_rx)
    }

    pub fn complete(self, handled: bool) {
        if self.outcome_tx.send(handled).is_err() {
            warn!("Delivery outcome receiver dropped before completion");
        }
    }
}

/// Runs `concurrency` independent workers, each processing one delivery at a time.
pub struct ConsumerPool<T> {
    coordinator: DeliveryCoordinator<T>,
    concurrency: usize,
}

impl<T> ConsumerPool<T>
where
    T: ErrorReportTransport + 'static,
{
    pub fn new(coordinator: DeliveryCoordinator<T>, concurrency: usize) -> Self {
        Self {
            coordinator,
            concurrency: concurrency.max(1),
        }
    }

    /// Consumes until the channel closes or `cancel` fires.
    ///
    /// Cancellation stops workers from fetching; a message already in flight
    /// finishes its lifecycle first.
    pub async fn run(self, deliveries: mpsc::Receiver<Delivery>, cancel: CancellationToken) {
        let deliveries = Arc::new(Mutex::new(deliveries));
        let mut workers = JoinSet::new();

        info!(concurrency = self.concurrency, "Starting consumer workers");

        for worker_id in 0..self.concurrency {
            let coordinator = self.coordinator.clone();
            let deliveries = Arc::clone(&deliveries);
            let cancel = cancel.clone();
            workers.spawn(run_worker(worker_id, coordinator, deliveries, cancel));
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                warn!("Consumer worker exited abnormally: {e}");
            }
        }

        info!("All consumer workers stopped");
    }
}

async fn run_worker<T>(
    worker_id: usize,
    coordinator: DeliveryCoordinator<T>,
    deliveries: Arc<Mutex<mpsc::Receiver<Delivery>>>,
    cancel: CancellationToken,
) where
    T: ErrorReportTransport + 'static,
{
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            delivery = async { deliveries.lock().await.recv().await } => delivery,
        };

        let Some(delivery) = next else {
            break;
        };

        let handled = coordinator.handle(&delivery.message).await;
        debug!(worker_id, handled, "Message processed");
        delivery.complete(handled);
    }

    debug!(worker_id, "Consumer worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorReport, LogLevel};
    use crate::sender::TransportError;
    use crate::translator::ErrorReportTranslator;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingTransport {
        sent: AtomicUsize,
    }

    impl ErrorReportTransport for CountingTransport {
        async fn send(&self, _report: &ErrorReport) -> Result<(), TransportError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct SlowTransport {
        started: Notify,
        sent: AtomicUsize,
    }

    impl ErrorReportTransport for SlowTransport {
        async fn send(&self, _report: &ErrorReport) -> Result<(), TransportError> {
            self.started.notify_one();
            tokio::time::sleep(Duration::from_secs(10)).await;
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn pool(concurrency: usize) -> (ConsumerPool<CountingTransport>, Arc<CountingTransport>) {
        let transport = Arc::new(CountingTransport::default());
        let coordinator = DeliveryCoordinator::new(
            ErrorReportTranslator::new(LogLevel::ERROR),
            Arc::clone(&transport),
        );
        (ConsumerPool::new(coordinator, concurrency), transport)
    }

    fn error_message(id: usize) -> QueueMessage {
        QueueMessage::new(format!(
            r#"{{"id":"e-{id}","level":3,"messages":[{{"message":"boom","level":3}}]}}"#
        ))
    }

    #[tokio::test]
    async fn test_outcomes_are_reported_per_delivery() {
        let (pool, transport) = pool(3);
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let runner = tokio::spawn(pool.run(rx, cancel));

        let mut outcomes = Vec::new();
        for id in 0..5 {
            let (delivery, outcome) = Delivery::new(error_message(id));
            tx.send(delivery).await.unwrap();
            outcomes.push(outcome);
        }
        let (bad, bad_outcome) = Delivery::new(QueueMessage::new("garbage"));
        tx.send(bad).await.unwrap();
        drop(tx);

        for outcome in outcomes {
            assert!(outcome.await.unwrap());
        }
        assert!(!bad_outcome.await.unwrap());

        runner.await.unwrap();
        assert_eq!(transport.sent.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_cancel_stops_idle_workers() {
        let (pool, _transport) = pool(2);
        let (_tx, rx) = mpsc::channel::<Delivery>(1);
        let cancel = CancellationToken::new();
        let runner = tokio::spawn(pool.run(rx, cancel.clone()));

        cancel.cancel();
        runner.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drains_in_flight_and_drops_buffered() {
        let transport = Arc::new(SlowTransport::default());
        let coordinator = DeliveryCoordinator::new(
            ErrorReportTranslator::new(LogLevel::ERROR),
            Arc::clone(&transport),
        );
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let runner = tokio::spawn(ConsumerPool::new(coordinator, 1).run(rx, cancel.clone()));

        let (in_flight, in_flight_outcome) = Delivery::new(error_message(1));
        tx.send(in_flight).await.unwrap();
        transport.started.notified().await;

        let (buffered, buffered_outcome) = Delivery::new(error_message(2));
        tx.send(buffered).await.unwrap();

        cancel.cancel();
        runner.await.unwrap();

        assert_eq!(in_flight_outcome.await, Ok(true));
        assert!(buffered_outcome.await.is_err());
        assert_eq!(transport.sent.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_concurrency_runs_one_worker() {
        let (pool, _transport) = pool(0);
        assert_eq!(pool.concurrency, 1);
    }
}
