//! # aimkg-rs
//!
//! Knowledge graph over machine-learning artifact metadata: tasks, datasets,
//! models and the pipelines that connect them, harvested from independent
//! sources and merged into one property graph.
//!
//! ## Architecture
//!
//! - **Ingestion** (batch, replayable): taxonomy classification, deterministic
//!   IDs, two-phase graph assembly, enrichment passes, embedding index build
//! - **Recommendation** (per request, read-only): multi-signal similarity
//!   ranking, bounded graph expansion, presentation-graph serialization
//! - **Stores**: Neo4j, or an in-process graph for tests and offline runs

pub mod edges;
pub mod errors;
pub mod ids;
pub mod nodes;
pub mod taxonomy;
pub mod types;

pub mod driver;
pub mod embedder;
pub mod index;

pub mod interchange;
pub mod source;

pub mod pipeline;
pub mod search;
pub mod utils;

pub use errors::{AimkgError, Result};
pub use types::AimkgConfig;
