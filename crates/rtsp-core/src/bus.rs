//! Partitioned append-only bus abstraction.
//!
//! `MessageBus` is the seam between the saga's DB-backed stages (outbox
//! publisher, inbox consumer) and the underlying broker. `KafkaBus` is the
//! production implementation; tests use an in-process fake (see
//! `rtsp-harness`).

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct BusMessage {
    pub value: Vec<u8>,
    pub headers: HashMap<String, String>,
}

/// One message queued for publish. `key = None` lets the partitioner spread
/// load across partitions rather than pinning every message to one.
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub topic: String,
    pub key: Option<String>,
    pub value: Vec<u8>,
    pub headers: HashMap<String, String>,
}

#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a batch. Either every message lands or the call returns an
    /// error — callers must not assume partial success.
    async fn publish_batch(&self, messages: Vec<OutboundMessage>) -> Result<()>;

    /// Fetch the next message for `consumer_group` on `topic`, waiting up to
    /// `timeout`. Returns `None` on timeout, which callers interpret as "no
    /// message available right now", not an error.
    async fn poll(
        &self,
        topic: &str,
        consumer_group: &str,
        timeout: Duration,
    ) -> Result<Option<BusMessage>>;

    /// Advance the consumer group's offset past the most recently polled
    /// message. Must be called only after the message's effect is durable.
    async fn commit(&self, topic: &str, consumer_group: &str) -> Result<()>;
}

pub mod kafka {
    use super::*;
    use anyhow::Context;
    use rdkafka::config::ClientConfig;
    use rdkafka::consumer::{Consumer, StreamConsumer};
    use rdkafka::message::{Header, Headers, OwnedHeaders};
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use rdkafka::Message as _;
    use std::time::Duration as StdDuration;
    use tokio::sync::Mutex;

    /// rdkafka-backed bus. One producer is shared process-wide; one
    /// consumer per (topic, consumer_group) pair is created lazily and
    /// cached, matching the "bus client is thread-safe and shared"
    /// resource model.
    pub struct KafkaBus {
        brokers: String,
        producer: FutureProducer,
        consumers: Mutex<HashMap<(String, String), StreamConsumer>>,
    }

    impl KafkaBus {
        pub fn new(brokers: &str) -> anyhow::Result<Self> {
            let producer: FutureProducer = ClientConfig::new()
                .set("bootstrap.servers", brokers)
                .set("message.timeout.ms", "30000")
                .set("acks", "all")
                .set("enable.idempotence", "true")
                .create()
                .context("build kafka producer")?;

            Ok(Self {
                brokers: brokers.to_string(),
                producer,
                consumers: Mutex::new(HashMap::new()),
            })
        }

        fn build_consumer(&self, topic: &str, consumer_group: &str) -> anyhow::Result<StreamConsumer> {
            let consumer: StreamConsumer = ClientConfig::new()
                .set("bootstrap.servers", &self.brokers)
                .set("group.id", consumer_group)
                .set("enable.auto.commit", "false")
                .set("auto.offset.reset", "earliest")
                .create()
                .context("build kafka consumer")?;
            consumer
                .subscribe(&[topic])
                .with_context(|| format!("subscribe to topic={topic}"))?;
            Ok(consumer)
        }
    }

    #[async_trait]
    impl MessageBus for KafkaBus {
        async fn publish_batch(&self, messages: Vec<OutboundMessage>) -> Result<()> {
            // Sequential, not concurrent: T1 already batched these rows
            // together, and a single `anyhow::Error` abort must not leave
            // some sends in flight with no way to tell which landed.
            for msg in &messages {
                let mut headers = OwnedHeaders::new();
                for (k, v) in &msg.headers {
                    headers = headers.insert(Header {
                        key: k.as_str(),
                        value: Some(v.as_str()),
                    });
                }

                let mut record = FutureRecord::to(&msg.topic)
                    .payload(&msg.value)
                    .headers(headers);
                if let Some(key) = msg.key.as_deref() {
                    record = record.key(key);
                }

                self.producer
                    .send(record, StdDuration::from_secs(10))
                    .await
                    .map_err(|(err, _owned)| anyhow::anyhow!("kafka publish failed: {err}"))?;
            }
            Ok(())
        }

        async fn poll(
            &self,
            topic: &str,
            consumer_group: &str,
            timeout: Duration,
        ) -> Result<Option<BusMessage>> {
            let key = (topic.to_string(), consumer_group.to_string());
            let mut consumers = self.consumers.lock().await;
            if !consumers.contains_key(&key) {
                let consumer = self.build_consumer(topic, consumer_group)?;
                consumers.insert(key.clone(), consumer);
            }
            let consumer = consumers.get(&key).expect("just inserted");

            let recv = consumer.recv();
            let message = match tokio::time::timeout(timeout, recv).await {
                Ok(Ok(message)) => message,
                Ok(Err(err)) => return Err(anyhow::anyhow!("kafka poll error: {err}").into()),
                Err(_elapsed) => return Ok(None),
            };

            let value = message.payload().unwrap_or_default().to_vec();
            let mut headers = HashMap::new();
            if let Some(h) = message.headers() {
                for i in 0..h.count() {
                    let header = h.get(i);
                    if let Some(v) = header.value {
                        headers.insert(
                            header.key.to_string(),
                            String::from_utf8_lossy(v).into_owned(),
                        );
                    }
                }
            }

            Ok(Some(BusMessage { value, headers }))
        }

        async fn commit(&self, topic: &str, consumer_group: &str) -> Result<()> {
            let key = (topic.to_string(), consumer_group.to_string());
            let consumers = self.consumers.lock().await;
            let Some(consumer) = consumers.get(&key) else {
                return Ok(());
            };
            consumer
                .commit_consumer_state(rdkafka::consumer::CommitMode::Async)
                .context("commit kafka offsets")?;
            Ok(())
        }
    }
}

pub use kafka::KafkaBus;
