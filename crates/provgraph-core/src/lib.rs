#![forbid(unsafe_code)]
//! provgraph-core library.
//!
//! Provenance graph model plus the two graph transforms: software-family
//! merging ([`merge`]) and cycle resolution ([`cycles`]).
//!
//! # Conventions
//!
//! - **Errors**: Library functions return [`error::Result`] with a
//!   [`error::GraphError`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
//! - **Ownership**: Transforms consume a [`ProvGraph`] and return a new one;
//!   queries borrow it.

pub mod cycles;
pub mod error;
pub mod merge;
pub mod model;
pub mod order;

pub use error::{ErrorCode, GraphError, Result};
pub use model::{NodeKind, ProvGraph, SEPARATOR, classify, family};
