//! Kindred: a beatmap similarity retrieval engine
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SimilarityEngine                         │
//! │        query orchestration, atomic table publication        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Per-query pipeline (request-scoped)            │
//! │    transform → bpm octave snap → standardize → rank         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   FeatureTable (mmap)                       │
//! │            immutable rows loaded from .kft shards           │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod bpm;
pub mod engine;
pub mod error;
pub mod format;
pub mod model;
pub mod mods;
pub mod rank;
pub mod standardize;
pub mod table;
pub mod transform;

pub use engine::{EngineConfig, QueryRequest, SimilarityEngine};
pub use error::EngineError;
pub use model::{QueryOutcome, ResultRow};
pub use mods::Mods;
pub use table::{FeatureRow, FeatureTable};
