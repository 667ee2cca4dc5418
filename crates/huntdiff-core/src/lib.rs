//! huntdiff-core library.
//!
//! The engine behind `huntdiff`: a global label store shared by every hunt,
//! an ordered hunt registry, reconciliation of cached per-hunt stats,
//! hunt lifecycle, comparison of two hunts, and a text diff for rule sources.
//!
//! # Conventions
//!
//! - **State**: every operation takes the [`state::AggregateState`]
//!   explicitly; callers load it from a [`store::StateStore`], run one
//!   operation, and save it only when the operation returned `Ok`.
//! - **Upstream**: sample sets and hunt details come through the
//!   [`upstream::HuntSource`] trait.
//! - **Errors**: engine operations return [`error::EngineError`]; config
//!   loading uses `anyhow::Result`.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod compare;
pub mod config;
pub mod containment;
pub mod diff;
pub mod error;
pub mod labeling;
pub mod labels;
pub mod lifecycle;
pub mod model;
pub mod reconcile;
pub mod registry;
pub mod state;
pub mod stats;
pub mod store;
pub mod upstream;
pub mod view;

pub use error::{EngineError, ErrorCode, UpstreamError};
pub use state::AggregateState;
