use ::redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::error::{AppError, AppResult};

/// Keys of values cached in Redis
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// TMDB movie details by TMDB id
    TmdbMovie(i64),
    /// TMDB search results for a cleaned title, optionally pinned to a year
    TmdbSearch { query: String, year: Option<i32> },
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::TmdbMovie(id) => write!(f, "tmdb:movie:{}", id),
            CacheKey::TmdbSearch { query, year } => match year {
                Some(year) => write!(f, "tmdb:search:{}:{}", query.to_lowercase(), year),
                None => write!(f, "tmdb:search:{}:any", query.to_lowercase()),
            },
        }
    }
}

/// Opens a Redis client; connections are made lazily per operation
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    Ok(Client::open(redis_url)?)
}

/// A serialized value waiting to be written
struct PendingWrite {
    key: String,
    payload: String,
    ttl_secs: u64,
}

/// Redis-backed lookup cache
///
/// Reads go straight to Redis. Writes are handed to a background
/// [`CacheWriter`] so request handlers never wait on them.
#[derive(Clone)]
pub struct Cache {
    client: Client,
    writes: mpsc::UnboundedSender<PendingWrite>,
}

/// Stops the background writer once queued writes are flushed
pub struct CacheWriterHandle {
    stop: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    pub async fn shutdown(self) {
        if self.stop.send(()).await.is_err() {
            tracing::warn!("Cache writer already stopped");
        }
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task panicked");
        }
    }
}

impl Cache {
    /// Builds the cache and spawns its writer task
    pub fn new(client: Client) -> (Self, CacheWriterHandle) {
        let (writes_tx, writes_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = mpsc::channel(1);

        let writer = CacheWriter {
            client: client.clone(),
            writes: writes_rx,
            stop: stop_rx,
            failed: 0,
        };
        let task = tokio::spawn(writer.run());

        (
            Self {
                client,
                writes: writes_tx,
            },
            CacheWriterHandle {
                stop: stop_tx,
                task,
            },
        )
    }

    /// Reads and decodes a cached value; `Ok(None)` on a miss
    ///
    /// A payload that no longer decodes is reported as `Internal` so callers
    /// can treat it like any other cache failure.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &CacheKey) -> AppResult<Option<T>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(key.to_string()).await?;

        raw.map(|payload| {
            serde_json::from_str(&payload).map_err(|e| {
                AppError::Internal(format!("Undecodable cache entry {}: {}", key, e))
            })
        })
        .transpose()
    }

    /// Queues `value` under `key` for `ttl_secs` seconds
    pub fn store_in_background<T: Serialize>(&self, key: &CacheKey, value: &T, ttl_secs: u64) {
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(key = %key, error = %e, "Could not serialize cache entry");
                return;
            }
        };

        let write = PendingWrite {
            key: key.to_string(),
            payload,
            ttl_secs,
        };
        if self.writes.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is gone, dropping write");
        }
    }
}

/// Background task applying queued writes with `SETEX`
struct CacheWriter {
    client: Client,
    writes: mpsc::UnboundedReceiver<PendingWrite>,
    stop: mpsc::Receiver<()>,
    failed: u64,
}

impl CacheWriter {
    async fn run(mut self) {
        tracing::info!("Cache writer started");

        loop {
            let write = tokio::select! {
                Some(write) = self.writes.recv() => write,
                _ = self.stop.recv() => break,
            };
            self.apply(write).await;
        }

        // Every `Cache` clone holds a sender, so the channel never closes on
        // its own; flush what is queued right now.
        while let Ok(write) = self.writes.try_recv() {
            self.apply(write).await;
        }

        tracing::info!(failed_writes = self.failed, "Cache writer stopped");
    }

    async fn apply(&mut self, write: PendingWrite) {
        let PendingWrite {
            key,
            payload,
            ttl_secs,
        } = write;

        if let Err(e) = self.set_ex(&key, payload, ttl_secs).await {
            self.failed += 1;
            tracing::error!(key = %key, failed_writes = self.failed, error = %e, "Cache write failed");
        }
    }

    async fn set_ex(&self, key: &str, payload: String, ttl_secs: u64) -> AppResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(key, payload, ttl_secs).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_key_format() {
        assert_eq!(CacheKey::TmdbMovie(949).to_string(), "tmdb:movie:949");
    }

    #[test]
    fn test_search_key_is_case_insensitive() {
        let upper = CacheKey::TmdbSearch {
            query: "The Matrix".to_string(),
            year: Some(1999),
        };
        let lower = CacheKey::TmdbSearch {
            query: "the matrix".to_string(),
            year: Some(1999),
        };
        assert_eq!(upper.to_string(), "tmdb:search:the matrix:1999");
        assert_eq!(upper.to_string(), lower.to_string());
    }

    #[test]
    fn test_search_key_without_year() {
        let key = CacheKey::TmdbSearch {
            query: "HEAT".to_string(),
            year: None,
        };
        assert_eq!(key.to_string(), "tmdb:search:heat:any");
    }

    #[tokio::test]
    async fn test_unreachable_redis_fails_lookup_but_not_writes() {
        // Nothing listens on port 1
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = Cache::new(client);

        let result: AppResult<Option<String>> = cache.lookup(&CacheKey::TmdbMovie(1)).await;
        assert!(result.is_err());

        cache.store_in_background(&CacheKey::TmdbMovie(1), &"payload", 60);
        handle.shutdown().await;
    }
}
