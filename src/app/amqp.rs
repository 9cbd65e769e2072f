use super::config::Config;
use super::consumer::Delivery;
use crate::domain::{CONTENT_ENCODING, ForwarderError, QueueMessage};
use futures::StreamExt;
use lapin::message::Delivery as AmqpDelivery;
use lapin::options::{BasicAckOptions, BasicConsumeOptions, BasicNackOptions, BasicQosOptions};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, Consumer, acker::Acker};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const CONSUMER_TAG: &str = "error-report-forwarder";
const REPLY_SUCCESS: u16 = 200;

/// RabbitMQ side of the forwarder: feeds deliveries to the worker pool and
/// settles each one once its outcome is known.
pub struct AmqpSource {
    connection: Connection,
    channel: Channel,
    consumer: Consumer,
    queue_name: String,
}

impl AmqpSource {
    pub async fn connect(config: &Config) -> Result<Self, ForwarderError> {
        let properties = ConnectionProperties::default()
            .with_connection_name(config.rabbitmq_connection_name.clone().into());

        let connection = Connection::connect(&config.amqp_uri(), properties)
            .await
            .map_err(|e| ForwarderError::Queue(format!("Failed to connect to RabbitMQ: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| ForwarderError::Queue(format!("Failed to open channel: {e}")))?;

        let prefetch = u16::try_from(config.concurrent_consumers).unwrap_or(u16::MAX);
        channel
            .basic_qos(prefetch, BasicQosOptions::default())
            .await
            .map_err(|e| ForwarderError::Queue(format!("Failed to set prefetch: {e}")))?;

        let consumer = channel
            .basic_consume(
                &config.rabbitmq_queue_name,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|e| {
                ForwarderError::Queue(format!(
                    "Failed to consume from '{}': {e}",
                    config.rabbitmq_queue_name
                ))
            })?;

        info!(
            host = %config.rabbitmq_host,
            port = config.rabbitmq_port,
            queue = %config.rabbitmq_queue_name,
            prefetch,
            "Connected to RabbitMQ"
        );

        Ok(Self {
            connection,
            channel,
            consumer,
            queue_name: config.rabbitmq_queue_name.clone(),
        })
    }

    /// Pumps deliveries into `deliveries` until cancelled or the broker stops
    /// the consumer. Outstanding acknowledgements are settled before returning.
    pub async fn run(
        &mut self,
        deliveries: mpsc::Sender<Delivery>,
        cancel: CancellationToken,
    ) -> Result<(), ForwarderError> {
        let mut settlements = JoinSet::new();
        let mut result = Ok(());

        loop {
            let next = tokio::select! {
                () = cancel.cancelled() => break,
                next = self.consumer.next() => next,
            };

            let amqp_delivery = match next {
                Some(Ok(amqp_delivery)) => amqp_delivery,
                Some(Err(e)) => {
                    result = Err(ForwarderError::Queue(format!("Consumer error: {e}")));
                    break;
                }
                None => {
                    warn!(queue = %self.queue_name, "Consumer stream ended");
                    break;
                }
            };

            let AmqpDelivery {
                data,
                properties,
                acker,
                delivery_tag,
                ..
            } = amqp_delivery;

            let message = queue_message(data, &properties);
            let (delivery, outcome) = Delivery::new(message);

            let forwarded = tokio::select! {
                () = cancel.cancelled() => false,
                sent = deliveries.send(delivery) => sent.is_ok(),
            };
            settlements.spawn(settle(acker, outcome, delivery_tag));
            if !forwarded {
                break;
            }

            while let Some(joined) = settlements.try_join_next() {
                if let Err(e) = joined {
                    error!("Settlement task failed: {e}");
                }
            }
        }

        drop(deliveries);
        debug!(pending = settlements.len(), "Waiting for outstanding settlements");
        while let Some(joined) = settlements.join_next().await {
            if let Err(e) = joined {
                error!("Settlement task failed: {e}");
            }
        }

        result
    }

    pub async fn close(self) -> Result<(), ForwarderError> {
        self.channel
            .close(REPLY_SUCCESS, "shutdown")
            .await
            .map_err(|e| ForwarderError::Queue(format!("Failed to close channel: {e}")))?;
        self.connection
            .close(REPLY_SUCCESS, "shutdown")
            .await
            .map_err(|e| ForwarderError::Queue(format!("Failed to close connection: {e}")))?;
        info!("RabbitMQ connection closed");
        Ok(())
    }
}

/// Acks when handled, otherwise nacks with requeue. A dropped outcome sender
/// counts as not handled.
async fn settle(acker: Acker, outcome: oneshot::Receiver<bool>, delivery_tag: u64) {
    let handled = outcome.await.unwrap_or(false);

    let settled = if handled {
        acker.ack(BasicAckOptions::default()).await
    } else {
        acker
            .nack(BasicNackOptions {
                requeue: true,
                ..Default::default()
            })
            .await
    };

    match settled {
        Ok(()) => debug!(delivery_tag, handled, "Delivery settled"),
        Err(e) => error!(delivery_tag, handled, "Failed to settle delivery: {e}"),
    }
}

fn queue_message(data: Vec<u8>, properties: &BasicProperties) -> QueueMessage {
    let message = QueueMessage::new(data);
    match content_encoding(properties) {
        Some(encoding) => message.with_header(CONTENT_ENCODING, encoding),
        None => message,
    }
}

/// The property wins over a `Content-Encoding` header.
fn content_encoding(properties: &BasicProperties) -> Option<String> {
    if let Some(encoding) = properties.content_encoding() {
        return Some(encoding.as_str().to_string());
    }

    let headers = properties.headers().as_ref()?;
    headers
        .inner()
        .iter()
        .find(|(key, _)| key.as_str().eq_ignore_ascii_case(CONTENT_ENCODING))
        .and_then(|(_, value)| match value {
            AMQPValue::LongString(s) => Some(String::from_utf8_lossy(s.as_bytes()).into_owned()),
            AMQPValue::ShortString(s) => Some(s.as_str().to_string()),
            _ => None,
        })
}
