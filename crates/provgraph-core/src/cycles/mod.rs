//! Cycle enumeration and resolution for provenance graphs.
//!
//! Provenance graphs should be acyclic (an artifact cannot feed the
//! execution that produced it), but merged or hand-edited graphs often are
//! not. This module finds every elementary cycle and removes edges until
//! none remain.
//!
//! ```rust,ignore
//! use provgraph_core::cycles::{DagifyConfig, dagify};
//!
//! let outcome = dagify(graph, &DagifyConfig::default())?;
//! for (from, to) in &outcome.removed {
//!     println!("removed {from} -> {to}");
//! }
//! ```

pub mod dagify;
pub mod elementary;

pub use dagify::{CycleResolver, DagifyConfig, DagifyOutcome, ResolverState, dagify};
pub use elementary::{Cycle, elementary_cycles};
