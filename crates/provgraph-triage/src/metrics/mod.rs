//! Importance metrics over provenance graphs.
//!
//! ```rust,ignore
//! use provgraph_triage::metrics::pagerank::{PageRankConfig, pagerank, most_important};
//!
//! let result = pagerank(&graph, &PageRankConfig::default())?;
//! if let Some(top) = most_important(&result) {
//!     println!("{} => {}", top.node, top.score);
//! }
//! ```

pub mod pagerank;
