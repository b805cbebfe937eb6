//! The shared vote queue.
//!
//! Submitted votes are appended to the tail of a named list in a shared
//! store; the downstream tally worker pops them from the head. This tier
//! only ever writes: a successful publish means the record reached the
//! store's write path, and nothing downstream is awaited. Records are never
//! deduplicated here.

use std::time::Duration;

use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client, RedisError,
};
use thiserror::Error;

use crate::model::ballot::VoteRecord;

/// Name of the shared queue consumed by the tally worker.
pub const VOTE_QUEUE: &str = "votes";

/// How long a connection attempt may take before it counts as a failure.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// How long the store may take to accept a write.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// The shared store cannot be reached or rejected the write.
#[derive(Debug, Error)]
#[error("Vote store unavailable: {0}")]
pub struct StoreUnavailable(#[from] RedisError);

/// Append-only access to the shared vote queue.
#[rocket::async_trait]
pub trait Publish: Send + Sync {
    /// Append one serialized record to the tail of the queue.
    async fn publish(&self, payload: &[u8]) -> Result<(), StoreUnavailable>;
}

/// Managed handle to the queue used by request handlers.
pub struct VoteQueue(Box<dyn Publish>);

impl VoteQueue {
    pub fn new(publisher: impl Publish + 'static) -> Self {
        Self(Box::new(publisher))
    }

    /// Serialize and enqueue a single vote record.
    ///
    /// Records published through one handle are appended in call order;
    /// ordering across concurrent publishers is whatever the store provides.
    pub async fn publish(&self, record: &VoteRecord) -> Result<(), StoreUnavailable> {
        let payload =
            serde_json::to_vec(record).expect("VoteRecord serialization does not fail");
        self.0.publish(&payload).await
    }
}

/// Publisher backed by a list in a shared redis store.
pub struct RedisQueue {
    conn: ConnectionManager,
}

impl RedisQueue {
    /// Connect to the store. The connection is multiplexed, reused across
    /// requests, and re-established on failure; an acquisition failure
    /// surfaces the same way as a write failure.
    pub async fn connect(url: &str) -> Result<Self, StoreUnavailable> {
        let config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(CONNECT_TIMEOUT)
            .set_response_timeout(RESPONSE_TIMEOUT);

        let client = Client::open(url)?;
        let conn = client.get_connection_manager_with_config(config).await?;

        Ok(Self { conn })
    }
}

#[rocket::async_trait]
impl Publish for RedisQueue {
    async fn publish(&self, payload: &[u8]) -> Result<(), StoreUnavailable> {
        let mut conn = self.conn.clone();
        let _queued: i64 = conn.rpush(VOTE_QUEUE, payload).await?;
        Ok(())
    }
}

/// In-memory queue standing in for the shared store in tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryQueue {
    entries: std::sync::Arc<std::sync::Mutex<std::collections::VecDeque<Vec<u8>>>>,
}

#[cfg(test)]
impl MemoryQueue {
    /// Number of records currently queued.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    /// Pop the record at the head of the queue, as the tally worker would.
    pub fn pop_head(&self) -> Option<Vec<u8>> {
        self.entries.lock().unwrap().pop_front()
    }
}

#[cfg(test)]
#[rocket::async_trait]
impl Publish for MemoryQueue {
    async fn publish(&self, payload: &[u8]) -> Result<(), StoreUnavailable> {
        self.entries.lock().unwrap().push_back(payload.to_vec());
        Ok(())
    }
}

/// Publisher whose store is always unreachable.
#[cfg(test)]
pub struct UnreachableQueue;

#[cfg(test)]
#[rocket::async_trait]
impl Publish for UnreachableQueue {
    async fn publish(&self, _payload: &[u8]) -> Result<(), StoreUnavailable> {
        Err(StoreUnavailable(RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
        ))))
    }
}

#[cfg(test)]
mod tests {
    use crate::model::voter::VoterId;

    use super::*;

    #[rocket::async_test]
    async fn published_record_survives_the_round_trip() {
        let store = MemoryQueue::default();
        let queue = VoteQueue::new(store.clone());

        let record = VoteRecord::new(VoterId::resolve(Some("abcd")), "Cats".to_string());
        queue.publish(&record).await.unwrap();

        let payload = store.pop_head().unwrap();
        let fetched: VoteRecord = serde_json::from_slice(&payload).unwrap();
        assert_eq!(record, fetched);

        // The wire contract is exactly two string fields.
        queue.publish(&record).await.unwrap();
        let raw: serde_json::Value = serde_json::from_slice(&store.pop_head().unwrap()).unwrap();
        let object = raw.as_object().unwrap();
        assert_eq!(2, object.len());
        assert_eq!("abcd", object["voter_id"]);
        assert_eq!("Cats", object["vote"]);
    }

    #[rocket::async_test]
    async fn publish_order_is_preserved() {
        let store = MemoryQueue::default();
        let queue = VoteQueue::new(store.clone());

        for vote in ["Cats", "Dogs", "Cats"] {
            let record = VoteRecord::new(VoterId::resolve(Some("abcd")), vote.to_string());
            queue.publish(&record).await.unwrap();
        }

        let votes = std::iter::from_fn(|| store.pop_head())
            .map(|payload| serde_json::from_slice::<VoteRecord>(&payload).unwrap().vote)
            .collect::<Vec<_>>();
        assert_eq!(vec!["Cats", "Dogs", "Cats"], votes);
    }
}
