use async_trait::async_trait;
use rtsp_core::bus::{BusMessage, MessageBus, OutboundMessage};
use rtsp_core::error::Result;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// In-process stand-in for `KafkaBus`. Each topic is an append-only
/// `Vec<BusMessage>`; each `(topic, consumer_group)` has a cursor that
/// `poll` peeks at and `commit` advances — mirroring manual-offset-commit
/// semantics without a broker.
#[derive(Default)]
pub struct FakeBus {
    topics: Mutex<HashMap<String, Vec<BusMessage>>>,
    cursors: Mutex<HashMap<(String, String), usize>>,
}

impl FakeBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn message_count(&self, topic: &str) -> usize {
        self.topics
            .lock()
            .unwrap()
            .get(topic)
            .map(|m| m.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl MessageBus for FakeBus {
    async fn publish_batch(&self, messages: Vec<OutboundMessage>) -> Result<()> {
        let mut topics = self.topics.lock().unwrap();
        for msg in messages {
            topics
                .entry(msg.topic)
                .or_default()
                .push(BusMessage {
                    value: msg.value,
                    headers: msg.headers,
                });
        }
        Ok(())
    }

    async fn poll(
        &self,
        topic: &str,
        consumer_group: &str,
        _timeout: Duration,
    ) -> Result<Option<BusMessage>> {
        let topics = self.topics.lock().unwrap();
        let cursors = self.cursors.lock().unwrap();
        let offset = *cursors
            .get(&(topic.to_string(), consumer_group.to_string()))
            .unwrap_or(&0);
        let message = topics
            .get(topic)
            .and_then(|messages| messages.get(offset))
            .cloned();
        Ok(message)
    }

    async fn commit(&self, topic: &str, consumer_group: &str) -> Result<()> {
        let mut cursors = self.cursors.lock().unwrap();
        let key = (topic.to_string(), consumer_group.to_string());
        let offset = cursors.entry(key).or_insert(0);
        *offset += 1;
        Ok(())
    }
}
