#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `effigy-engine` defines the seam between managed code and a native raster
//! engine. Everything on the far side of [`RasterEngine`] (codecs, pixel
//! algorithms, color math) belongs to the engine; this crate owns the
//! discipline around it:
//!
//! - **Handles**: [`RasterId`] is an opaque engine identifier and
//!   [`RasterHandle`] is its exclusive, move-only owner with deterministic
//!   release.
//! - **Entry points**: the [`RasterEngine`] trait enumerates the calls the
//!   binding layer forwards to, including the linked-list plumbing that
//!   whole-chain operations depend on.
//! - **Diagnostics**: fatal conditions surface as [`EngineError`]; warnings
//!   and progress reports flow through an [`EventSink`] passed explicitly
//!   into each call that can emit them.
//! - **Limits and metadata**: global resource limits and format/quantum
//!   capability queries, mirrored straight from the engine with no managed
//!   cache.

/// Engine boundary trait.
pub mod engine;

/// Error types for the engine boundary.
pub mod error;

/// Warning and progress observer plumbing.
pub mod events;

/// Opaque resource ids and the owning handle wrapper.
pub mod handle;

/// Format, quantum and per-resource metadata.
pub mod info;

/// Process-wide engine resource limits.
pub mod limits;

/// Operation vocabulary and the settings payload mirrored into the engine.
pub mod options;

pub use crate::engine::RasterEngine;
pub use crate::error::EngineError;
pub use crate::events::{EventSink, NullSink, Progress, Severity, Warning};
pub use crate::handle::{RasterHandle, RasterId};
pub use crate::info::{Format, FormatInfo, QuantumInfo, RasterInfo, RasterSpec};
pub use crate::limits::{LimitKind, ResourceLimits};
pub use crate::options::{
    ChainOp, ChainOutcome, DrawOptions, QuantizeOptions, RasterOp, ReadOptions, SettingsPayload,
};
