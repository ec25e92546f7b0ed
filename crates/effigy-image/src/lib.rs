#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `effigy-image` is the managed side of the effigy binding layer. It
//! composes the engine-boundary primitives from `effigy-engine` into the
//! user-facing types:
//!
//! - [`Image`]: one exclusively owned engine resource plus its settings
//!   cache and observer relay. Mutating operations validate locally, forward
//!   to the engine with the current settings snapshot, and adopt replacement
//!   resources in place.
//! - [`ImageSettings`]: the validated settings cache projected into the
//!   engine with every call that consumes settings.
//! - [`ImageSource`]: buffer, file and stream inputs normalized into the
//!   byte payload the engine's read entry point requires.
//! - [`ImageCollection`]: an ordered image sequence that threads itself into
//!   the engine's linked-list shape around each batch operation and is
//!   guaranteed to unthread afterwards, even on failure.
//!
//! Warnings and progress reports from the engine surface through explicitly
//! registered observers; see [`Relay`].

/// Ordered image sequences and linked-batch operations.
pub mod collection;

/// Error types for the managed image layer.
pub mod error;

/// The image entity.
pub mod image;

/// Observer registration and event dispatch.
pub mod relay;

/// The validated settings cache and its engine projection.
pub mod settings;

/// Input source normalization.
pub mod source;

pub use crate::collection::ImageCollection;
pub use crate::error::ImageError;
pub use crate::image::Image;
pub use crate::relay::{ProgressHandler, Relay, WarningHandler};
pub use crate::settings::ImageSettings;
pub use crate::source::ImageSource;
