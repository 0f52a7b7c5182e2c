//! Strata Common - Shared ids, errors, predicate vocabulary, and configuration

pub mod cancellation;
pub mod config;
pub mod error;
pub mod types;

pub use cancellation::CancellationToken;
pub use config::EngineConfig;
pub use error::{Result, StrataError};
pub use types::{
    ChunkId, ChunkOffset, ColumnId, OrderMode, PredicateCondition, ValueId, INVALID_CHUNK_ID,
    INVALID_CHUNK_OFFSET, INVALID_VALUE_ID,
};
