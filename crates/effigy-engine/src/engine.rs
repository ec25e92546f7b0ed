use crate::error::EngineError;
use crate::events::EventSink;
use crate::handle::RasterId;
use crate::info::{Format, FormatInfo, QuantumInfo, RasterInfo, RasterSpec};
use crate::limits::LimitKind;
use crate::options::{ChainOp, ChainOutcome, RasterOp, ReadOptions, SettingsPayload};

/// The native engine boundary.
///
/// Every entry point the binding layer forwards to, collected behind one
/// trait so a linked C backend and an in-memory test double plug in
/// identically. Implementations own all pixel work; callers own resource
/// lifetimes: any [`RasterId`] returned from [`create`](Self::create),
/// [`clone_raster`](Self::clone_raster), [`read`](Self::read),
/// [`apply`](Self::apply) or [`run_chain`](Self::run_chain) must eventually
/// be passed to [`release`](Self::release), which the
/// [`RasterHandle`](crate::RasterHandle) wrapper does deterministically.
///
/// Fatal conditions are returned as [`EngineError`]; recoverable anomalies
/// and progress reports are delivered synchronously through the
/// [`EventSink`] argument of the call that produced them and never abort it.
///
/// Implementations must be safe to share across threads, but an individual
/// raster must not be operated on from two threads at once; the binding layer
/// never does so on its own.
pub trait RasterEngine: Send + Sync {
    /// Allocates a blank raster.
    fn create(&self, spec: &RasterSpec) -> Result<RasterId, EngineError>;

    /// Duplicates a raster at the pixel level, yielding a new independent
    /// resource. The duplicate starts unlinked regardless of the source's
    /// chain state.
    fn clone_raster(&self, id: RasterId) -> Result<RasterId, EngineError>;

    /// Frees an engine resource.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownHandle`] when the id was never handed out or was
    /// already released; the wrapper's state machine prevents the latter.
    fn release(&self, id: RasterId) -> Result<(), EngineError>;

    /// Per-resource metadata.
    fn describe(&self, id: RasterId) -> Result<RasterInfo, EngineError>;

    /// Capability record for a format, `None` when the engine build does not
    /// include the codec.
    fn format_info(&self, format: Format) -> Option<FormatInfo>;

    /// Channel depth of the engine build.
    fn quantum(&self) -> QuantumInfo;

    /// Decodes a byte payload into one raster per frame, in frame order.
    ///
    /// # Arguments
    ///
    /// * `payload` - The encoded bytes; callers normalize files and streams
    ///   into this shape beforehand.
    /// * `options` - Format hint and frame window.
    /// * `events` - Receives decode warnings.
    fn read(
        &self,
        payload: &[u8],
        options: &ReadOptions,
        events: &mut dyn EventSink,
    ) -> Result<Vec<RasterId>, EngineError>;

    /// Encodes the chain rooted at `head`, following next-links, into a
    /// single byte payload.
    fn write(
        &self,
        head: RasterId,
        settings: &SettingsPayload,
        events: &mut dyn EventSink,
    ) -> Result<Vec<u8>, EngineError>;

    /// Threads or clears a raster's next-link. Chain operations walk these
    /// links from the head they are handed.
    fn set_next(&self, id: RasterId, next: Option<RasterId>) -> Result<(), EngineError>;

    /// Reads back a raster's next-link.
    fn next_of(&self, id: RasterId) -> Result<Option<RasterId>, EngineError>;

    /// Runs a single-image operation.
    ///
    /// # Returns
    ///
    /// `Some(id)` when the operation produced a replacement resource the
    /// caller must adopt in place of the original (which stays alive until
    /// released); `None` when the operation mutated the resource in place.
    fn apply(
        &self,
        id: RasterId,
        op: &RasterOp,
        settings: &SettingsPayload,
        events: &mut dyn EventSink,
    ) -> Result<Option<RasterId>, EngineError>;

    /// Runs a whole-chain operation against the linked list rooted at
    /// `head`.
    ///
    /// # Returns
    ///
    /// [`ChainOutcome::Frames`] with newly owned result rasters, or
    /// [`ChainOutcome::InPlace`] when the chained rasters were mutated where
    /// they stand.
    fn run_chain(
        &self,
        head: RasterId,
        op: &ChainOp,
        settings: &SettingsPayload,
        events: &mut dyn EventSink,
    ) -> Result<ChainOutcome, EngineError>;

    /// Pixel-level equality of two rasters of equal dimensions.
    fn pixels_equal(&self, left: RasterId, right: RasterId) -> Result<bool, EngineError>;

    /// Current value of a global resource limit.
    fn limit(&self, kind: LimitKind) -> u64;

    /// Updates a global resource limit.
    fn set_limit(&self, kind: LimitKind, value: u64);
}
