//! alertmap: community incident reports with a reaction ledger, cached
//! counters, and reputation statistics.
//!
//! The [`service::AlertService`] runs every operation against a [`store::Store`]
//! backend; [`http::router`] exposes it over HTTP.

pub mod catalog;
pub mod config;
pub mod engine;
pub mod errors;
pub mod http;
pub mod id;
pub mod keys;
pub mod runtime;
pub mod service;
pub mod store;
pub mod types;
pub mod validators;

pub use catalog::{Category, CategoryCatalog};
pub use config::{AppConfig, ConfigError, StorageBackend};
pub use engine::{REPUTATION_WEIGHTS, ReactionTransition, ReputationWeights, UserStatistics};
pub use errors::*;
pub use id::{AlertId, CommentId, UserId};
pub use service::{AlertService, AlertView, NearbyQuery, RecomputeSummary};
pub use store::{MemoryStore, ReactionOutcome, RedisStore, Store};
pub use types::*;

// Re-export redis types so users don't need to depend on a specific redis version
pub use redis;
pub use redis::aio::ConnectionManager;

/// Delete all keys matching a pattern (for test cleanup).
///
/// This performs a SCAN + DEL operation to safely delete keys without blocking Redis.
pub async fn cleanup_pattern(conn: &mut ConnectionManager, pattern: &str) -> Result<u64, ServiceError> {
    const SCAN_COUNT: usize = 1000;
    let mut cursor: u64 = 0;
    let mut total_deleted: u64 = 0;

    loop {
        let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
            .arg(cursor)
            .arg("MATCH")
            .arg(pattern)
            .arg("COUNT")
            .arg(SCAN_COUNT)
            .query_async(conn)
            .await?;

        if !keys.is_empty() {
            let deleted: u64 = redis::cmd("DEL").arg(&keys).query_async(conn).await?;
            total_deleted += deleted;
        }

        cursor = next_cursor;
        if cursor == 0 {
            break;
        }
    }

    Ok(total_deleted)
}
