#![forbid(unsafe_code)]
//! provgraph-triage library.
//!
//! Read-only analytics over a [`provgraph_core::ProvGraph`]:
//!
//! - [`metrics::pagerank`]: which node is most structurally important.
//! - [`impact`]: how much of the graph fails if a node fails.
//! - [`ancestry`]: how ancestor weight flows into a node.
//!
//! # Conventions
//!
//! - **Errors**: Return [`provgraph_core::Result`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod ancestry;
pub mod impact;
pub mod metrics;

pub use ancestry::{AncestorKeying, ancestor_weight};
pub use impact::{
    KnockDown, MostKnocked, knock_down_and_remove, knocked_down, most_knocked_down,
    most_knocked_down_data,
};
pub use metrics::pagerank::{PageRankConfig, PageRankResult, Ranked, most_important, pagerank};
