use redis::{aio::ConnectionManager, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use tokio::sync::{mpsc, oneshot};

use crate::error::{AppError, AppResult};

/// Queued writes beyond this are dropped; the value is simply fetched again later
const WRITE_QUEUE_CAPACITY: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Metadata for a title from one source ("tmdb", "omdb")
    MovieDetails { source: &'static str, title: String },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::MovieDetails { source, title } => {
                write!(f, "movie:{}:{}", source, title.trim().to_lowercase())
            }
        }
    }
}

pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

struct PendingWrite {
    key: String,
    json: String,
    ttl: u64,
}

/// JSON values in Redis behind a reconnecting connection
///
/// Reads go straight to Redis. Writes are handed to a background task so a
/// response never waits on a cache store.
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    writes: mpsc::Sender<PendingWrite>,
}

/// Stops the background writer after it flushes what is queued
pub struct CacheWriterHandle {
    stop: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
        tracing::info!("Cache writer stopped");
    }
}

impl Cache {
    /// Connects to Redis and starts the background writer
    pub async fn connect(client: Client) -> AppResult<(Self, CacheWriterHandle)> {
        let conn = ConnectionManager::new(client).await?;
        let (writes, queue) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let (stop, stopped) = oneshot::channel();

        let task = tokio::spawn(run_writer(conn.clone(), queue, stopped));

        Ok((Self { conn, writes }, CacheWriterHandle { stop, task }))
    }

    /// `None` on a miss
    pub async fn get_json<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(key.to_string()).await?;
        raw.map(|json| {
            serde_json::from_str(&json)
                .map_err(|e| AppError::Internal(format!("Cached value for {} is unreadable: {}", key, e)))
        })
        .transpose()
    }

    /// Queues `value` for storage with a TTL in seconds
    pub fn put_json<T: Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            json,
            ttl,
        };
        if let Err(e) = self.writes.try_send(write) {
            tracing::warn!(error = %e, key = %key, "Cache write dropped");
        }
    }
}

async fn run_writer(
    mut conn: ConnectionManager,
    mut queue: mpsc::Receiver<PendingWrite>,
    mut stopped: oneshot::Receiver<()>,
) {
    tracing::debug!("Cache writer started");

    loop {
        tokio::select! {
            Some(write) = queue.recv() => store(&mut conn, write).await,
            _ = &mut stopped => break,
        }
    }

    // Every Cache clone holds a sender, so drain instead of waiting for close
    let mut flushed = 0usize;
    while let Ok(write) = queue.try_recv() {
        store(&mut conn, write).await;
        flushed += 1;
    }
    tracing::info!(flushed, "Cache writer flushed pending writes");
}

async fn store(conn: &mut ConnectionManager, write: PendingWrite) {
    let result: redis::RedisResult<()> = conn.set_ex(&write.key, write.json, write.ttl).await;
    if let Err(e) = result {
        tracing::error!(error = %e, key = %write.key, "Failed to write to Redis cache");
    }
}
