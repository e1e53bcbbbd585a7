//! CityVoice Domain Layer
//!
//! This crate contains the core value types for CityVoice and the capability
//! traits that the pipeline depends on. Infrastructure (LLM clients, file
//! persistence) lives in other crates and implements these traits.
//!
//! ## Key Concepts
//!
//! - **Item**: One ingested civic suggestion with author, text and metadata
//! - **Relation**: A discovered pairwise connection between two items
//! - **Topic**: Coarse keyword-based category assigned to every item
//! - **Cluster**: A topic-scoped, connectivity-derived subgroup of items
//! - **Demand**: A deduplicated actionable ask extracted from a cluster
//! - **Proposal**: A concrete policy recommendation combining demands
//!
//! ## Architecture
//!
//! - Pure value types, no I/O
//! - Trait definitions for all external interactions (see [`traits`])

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cluster;
pub mod item;
pub mod relation;
pub mod traits;

// Re-exports for convenience
pub use cluster::{Cluster, ClusterLabel, Consensus, Demand, Proposal, MISC_TOPIC_ID};
pub use item::{Item, ItemId, ItemStatus};
pub use relation::{RelatedItem, Relation};
