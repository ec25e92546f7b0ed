#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `effigy-test` provides [`TestEngine`], an in-memory implementation of
//! [`RasterEngine`] for exercising the binding layer without a native
//! library. It keeps a handle table with full accounting (live handles,
//! release order, total created), so leak and double-free properties are
//! directly assertable, and it can be scripted to fail an operation, emit a
//! warning, or report synthetic progress.
//!
//! Frames are solid-color rectangles and the chain operations implement just
//! enough arithmetic (summed append widths, morph frame counts, palette
//! masking) for contract tests to observe real differences in outcomes.

pub mod payload;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use effigy_engine::{
    ChainOp, ChainOutcome, EngineError, EventSink, Format, FormatInfo, LimitKind, Progress,
    QuantumInfo, RasterEngine, RasterId, RasterInfo, RasterOp, RasterSpec, ReadOptions,
    SettingsPayload, Warning,
};

pub use crate::payload::FrameSpec;

#[derive(Clone, Debug)]
struct Frame {
    width: u32,
    height: u32,
    format: Format,
    color: [u8; 4],
    pixels: Vec<u8>,
    delay: u32,
    next: Option<RasterId>,
}

impl Frame {
    fn solid(width: u32, height: u32, color: [u8; 4], format: Format, delay: u32) -> Self {
        let count = width as usize * height as usize;
        let mut pixels = Vec::with_capacity(count * 4);
        for _ in 0..count {
            pixels.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            format,
            color,
            pixels,
            delay,
            next: None,
        }
    }

    /// A pixel-level copy that starts unlinked.
    fn duplicate(&self) -> Self {
        Self {
            next: None,
            ..self.clone()
        }
    }
}

#[derive(Default)]
struct State {
    next_raw: u64,
    created: u64,
    frames: HashMap<RasterId, Frame>,
    released: Vec<RasterId>,
    failures: Vec<(String, String)>,
    warnings: HashMap<String, String>,
    progress_ticks: u64,
    limits: HashMap<LimitKind, u64>,
}

fn alloc(state: &mut State, frame: Frame) -> RasterId {
    state.next_raw += 1;
    state.created += 1;
    let id = RasterId::from_raw(state.next_raw).expect("id counter starts at one");
    state.frames.insert(id, frame);
    id
}

fn frame(state: &State, id: RasterId) -> Result<&Frame, EngineError> {
    state.frames.get(&id).ok_or(EngineError::UnknownHandle(id))
}

fn frame_mut(state: &mut State, id: RasterId) -> Result<&mut Frame, EngineError> {
    state
        .frames
        .get_mut(&id)
        .ok_or(EngineError::UnknownHandle(id))
}

/// The ids reachable from `head` by following next-links, head first.
fn chain_of(state: &State, head: RasterId) -> Result<Vec<RasterId>, EngineError> {
    let mut ids = Vec::new();
    let mut cursor = Some(head);
    while let Some(id) = cursor {
        if ids.len() > state.frames.len() {
            return Err(EngineError::Contract("next-links form a cycle".into()));
        }
        ids.push(id);
        cursor = frame(state, id)?.next;
    }
    Ok(ids)
}

fn take_failure(state: &mut State, op: &str) -> Option<String> {
    let index = state.failures.iter().position(|(name, _)| name == op)?;
    Some(state.failures.remove(index).1)
}

fn default_limit(kind: LimitKind) -> u64 {
    match kind {
        LimitKind::Memory => 1 << 32,
        LimitKind::Disk => u64::MAX,
        LimitKind::Thread => 4,
        LimitKind::Throttle => 0,
        LimitKind::Width => 1 << 16,
        LimitKind::Height => 1 << 16,
    }
}

/// Delivers a staged warning and synthetic progress for `op`.
///
/// Runs with the state lock dropped, so observer callbacks may call back
/// into the engine without deadlocking.
fn emit(
    op: &str,
    warning: Option<String>,
    ticks: u64,
    events: &mut dyn EventSink,
) -> Result<(), EngineError> {
    if let Some(message) = warning {
        events.warning(&Warning::new(message));
    }
    for tick in 0..ticks {
        let progress = Progress {
            origin: op.to_string(),
            completed: tick + 1,
            total: ticks,
        };
        if !events.progress(&progress) {
            return Err(EngineError::Cancelled);
        }
    }
    Ok(())
}

/// Joins frames edge to edge; `gap` widens (or, negative, overlaps) every
/// seam.
fn join_frames(frames: &[Frame], vertically: bool, gap: i64) -> Frame {
    let head = &frames[0];
    let seams = frames.len().saturating_sub(1) as i64;
    let (width, height) = if vertically {
        let width = frames.iter().map(|f| f.width).max().unwrap_or(1);
        let height = frames.iter().map(|f| i64::from(f.height)).sum::<i64>() + gap * seams;
        (width, height.clamp(1, i64::from(u32::MAX)) as u32)
    } else {
        let width = frames.iter().map(|f| i64::from(f.width)).sum::<i64>() + gap * seams;
        let height = frames.iter().map(|f| f.height).max().unwrap_or(1);
        (width.clamp(1, i64::from(u32::MAX)) as u32, height)
    };
    Frame::solid(width, height, head.color, head.format, head.delay)
}

/// In-memory [`RasterEngine`] with handle accounting and scripted
/// diagnostics.
#[derive(Default)]
pub struct TestEngine {
    state: Mutex<State>,
}

impl TestEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an engine already wrapped for use as an `Arc<dyn
    /// RasterEngine>`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("test engine state poisoned")
    }

    /// Consumes any scripted failure for `op` and reads the staged warning
    /// and progress tick count.
    fn stage(&self, op: &str) -> Result<(Option<String>, u64), EngineError> {
        let mut state = self.lock();
        if let Some(message) = take_failure(&mut state, op) {
            return Err(EngineError::Native { message });
        }
        Ok((state.warnings.get(op).cloned(), state.progress_ticks))
    }

    /// Number of resources currently alive.
    pub fn live_count(&self) -> usize {
        self.lock().frames.len()
    }

    /// Total resources ever handed out.
    pub fn total_created(&self) -> u64 {
        self.lock().created
    }

    /// Ids released so far, in release order.
    pub fn released(&self) -> Vec<RasterId> {
        self.lock().released.clone()
    }

    /// Dimensions of a live resource, for test assertions.
    pub fn dimensions(&self, id: RasterId) -> Option<(u32, u32)> {
        self.lock().frames.get(&id).map(|f| (f.width, f.height))
    }

    /// Fill color of a live resource, for test assertions.
    pub fn color(&self, id: RasterId) -> Option<[u8; 4]> {
        self.lock().frames.get(&id).map(|f| f.color)
    }

    /// Scripts the next call of `op` (by its stable name) to fail fatally
    /// with `message`. Consumed by the first matching call.
    pub fn fail_next(&self, op: &str, message: &str) {
        self.lock()
            .failures
            .push((op.to_string(), message.to_string()));
    }

    /// Scripts every call of `op` to emit one warning with `message`.
    pub fn warn_on(&self, op: &str, message: &str) {
        self.lock()
            .warnings
            .insert(op.to_string(), message.to_string());
    }

    /// Number of synthetic progress reports emitted per read, write or chain
    /// call. Zero (the default) disables progress.
    pub fn set_progress_ticks(&self, ticks: u64) {
        self.lock().progress_ticks = ticks;
    }
}

impl RasterEngine for TestEngine {
    fn create(&self, spec: &RasterSpec) -> Result<RasterId, EngineError> {
        let mut state = self.lock();
        if let Some(message) = take_failure(&mut state, "create") {
            return Err(EngineError::Native { message });
        }
        if spec.width == 0 || spec.height == 0 {
            return Err(EngineError::native(format!(
                "invalid canvas geometry {}x{}",
                spec.width, spec.height
            )));
        }
        Ok(alloc(
            &mut state,
            Frame::solid(spec.width, spec.height, spec.background, spec.format, 0),
        ))
    }

    fn clone_raster(&self, id: RasterId) -> Result<RasterId, EngineError> {
        let mut state = self.lock();
        if let Some(message) = take_failure(&mut state, "clone") {
            return Err(EngineError::Native { message });
        }
        let copy = frame(&state, id)?.duplicate();
        Ok(alloc(&mut state, copy))
    }

    fn release(&self, id: RasterId) -> Result<(), EngineError> {
        let mut state = self.lock();
        if state.frames.remove(&id).is_none() {
            return Err(EngineError::UnknownHandle(id));
        }
        state.released.push(id);
        Ok(())
    }

    fn describe(&self, id: RasterId) -> Result<RasterInfo, EngineError> {
        let state = self.lock();
        let frame = frame(&state, id)?;
        Ok(RasterInfo {
            width: frame.width,
            height: frame.height,
            format: frame.format,
            frame_delay: frame.delay,
        })
    }

    fn format_info(&self, format: Format) -> Option<FormatInfo> {
        let description = match format {
            Format::Bmp => "Windows bitmap",
            Format::Gif => "Graphics interchange format",
            Format::Jpeg => "Joint Photographic Experts Group",
            Format::Png => "Portable network graphics",
            Format::Tiff => "Tagged image file format",
            Format::WebP => "WebP",
            Format::Unknown => return None,
        };
        Some(FormatInfo {
            format,
            description: description.to_string(),
            mime_type: format!("image/{}", format.name()),
            readable: true,
            writable: true,
            supports_multiple_frames: matches!(
                format,
                Format::Gif | Format::Tiff | Format::WebP
            ),
        })
    }

    fn quantum(&self) -> QuantumInfo {
        QuantumInfo { depth: 8, max: 255 }
    }

    fn read(
        &self,
        payload: &[u8],
        options: &ReadOptions,
        events: &mut dyn EventSink,
    ) -> Result<Vec<RasterId>, EngineError> {
        let (warning, ticks) = self.stage("read")?;
        let (tagged, specs) = payload::decode(payload)?;
        emit("read", warning, ticks, events)?;

        let start = options.frame_index.unwrap_or(0) as usize;
        if start >= specs.len() {
            return Err(EngineError::native(format!(
                "frame index {start} beyond frame count {}",
                specs.len()
            )));
        }
        let end = options
            .frame_count
            .map_or(specs.len(), |count| (start + count as usize).min(specs.len()));
        let format = options.format.unwrap_or(tagged);

        let mut state = self.lock();
        Ok(specs[start..end]
            .iter()
            .map(|spec| {
                alloc(
                    &mut state,
                    Frame::solid(spec.width, spec.height, spec.color, format, spec.delay),
                )
            })
            .collect())
    }

    fn write(
        &self,
        head: RasterId,
        settings: &SettingsPayload,
        events: &mut dyn EventSink,
    ) -> Result<Vec<u8>, EngineError> {
        let (warning, ticks) = self.stage("write")?;
        let (fallback, specs) = {
            let state = self.lock();
            let chain = chain_of(&state, head)?;
            let mut specs = Vec::with_capacity(chain.len());
            for id in &chain {
                let frame = frame(&state, *id)?;
                specs.push(FrameSpec {
                    width: frame.width,
                    height: frame.height,
                    color: frame.color,
                    delay: frame.delay,
                });
            }
            (frame(&state, head)?.format, specs)
        };
        emit("write", warning, ticks, events)?;
        Ok(payload::encode(settings.format.unwrap_or(fallback), &specs))
    }

    fn set_next(&self, id: RasterId, next: Option<RasterId>) -> Result<(), EngineError> {
        let mut state = self.lock();
        if let Some(next) = next {
            frame(&state, next)?;
        }
        frame_mut(&mut state, id)?.next = next;
        Ok(())
    }

    fn next_of(&self, id: RasterId) -> Result<Option<RasterId>, EngineError> {
        let state = self.lock();
        Ok(frame(&state, id)?.next)
    }

    fn apply(
        &self,
        id: RasterId,
        op: &RasterOp,
        _settings: &SettingsPayload,
        events: &mut dyn EventSink,
    ) -> Result<Option<RasterId>, EngineError> {
        let (warning, ticks) = self.stage(op.name())?;
        {
            let state = self.lock();
            frame(&state, id)?;
        }
        emit(op.name(), warning, ticks, events)?;

        let mut state = self.lock();
        match op {
            RasterOp::Resize { width, height } => {
                let source = frame(&state, id)?.clone();
                let resized =
                    Frame::solid(*width, *height, source.color, source.format, source.delay);
                Ok(Some(alloc(&mut state, resized)))
            }
            RasterOp::Crop {
                width, height, ..
            } => {
                let source = frame(&state, id)?.clone();
                let cropped = Frame::solid(
                    (*width).min(source.width),
                    (*height).min(source.height),
                    source.color,
                    source.format,
                    source.delay,
                );
                Ok(Some(alloc(&mut state, cropped)))
            }
            RasterOp::Flip => {
                let frame = frame_mut(&mut state, id)?;
                let row = frame.width as usize * 4;
                if row > 0 {
                    frame.pixels = frame
                        .pixels
                        .chunks(row)
                        .rev()
                        .flat_map(|chunk| chunk.iter().copied())
                        .collect();
                }
                Ok(None)
            }
            RasterOp::Flop => {
                let frame = frame_mut(&mut state, id)?;
                let row = frame.width as usize * 4;
                if row > 0 {
                    frame.pixels = frame
                        .pixels
                        .chunks(row)
                        .flat_map(|chunk| {
                            chunk
                                .chunks(4)
                                .rev()
                                .flat_map(|px| px.iter().copied())
                                .collect::<Vec<_>>()
                        })
                        .collect();
                }
                Ok(None)
            }
            RasterOp::Rotate { degrees } => {
                let source = frame(&state, id)?.clone();
                let quarter_turns = (degrees / 90.0).round() as i64 % 4;
                let (width, height) = if quarter_turns % 2 == 0 {
                    (source.width, source.height)
                } else {
                    (source.height, source.width)
                };
                let rotated =
                    Frame::solid(width, height, source.color, source.format, source.delay);
                Ok(Some(alloc(&mut state, rotated)))
            }
        }
    }

    fn run_chain(
        &self,
        head: RasterId,
        op: &ChainOp,
        _settings: &SettingsPayload,
        events: &mut dyn EventSink,
    ) -> Result<ChainOutcome, EngineError> {
        let (warning, ticks) = self.stage(op.name())?;
        let chain = {
            let state = self.lock();
            chain_of(&state, head)?
        };
        emit(op.name(), warning, ticks, events)?;

        let mut state = self.lock();
        let frames = chain
            .iter()
            .map(|id| frame(&state, *id).map(Frame::clone))
            .collect::<Result<Vec<_>, _>>()?;

        match op {
            ChainOp::Append { vertically } => {
                let joined = join_frames(&frames, *vertically, 0);
                Ok(ChainOutcome::Frames(vec![alloc(&mut state, joined)]))
            }
            ChainOp::Smush { offset, vertically } => {
                let joined = join_frames(&frames, *vertically, i64::from(*offset));
                Ok(ChainOutcome::Frames(vec![alloc(&mut state, joined)]))
            }
            ChainOp::Coalesce
            | ChainOp::Deconstruct
            | ChainOp::Optimize
            | ChainOp::OptimizeTransparency => {
                let ids = frames
                    .iter()
                    .map(|frame| alloc(&mut state, frame.duplicate()))
                    .collect();
                Ok(ChainOutcome::Frames(ids))
            }
            ChainOp::Flatten | ChainOp::Merge | ChainOp::Mosaic | ChainOp::Combine => {
                let flat = frames[0].duplicate();
                Ok(ChainOutcome::Frames(vec![alloc(&mut state, flat)]))
            }
            ChainOp::Morph { frames: per_pair } => {
                let mut ids = Vec::new();
                for (index, frame) in frames.iter().enumerate() {
                    ids.push(alloc(&mut state, frame.duplicate()));
                    if index + 1 < frames.len() {
                        for _ in 0..*per_pair {
                            ids.push(alloc(&mut state, frame.duplicate()));
                        }
                    }
                }
                Ok(ChainOutcome::Frames(ids))
            }
            ChainOp::Quantize(options) => {
                let step = (256 / options.colors.clamp(1, 256)).clamp(1, 255) as u8;
                for id in &chain {
                    let frame = frame_mut(&mut state, *id)?;
                    for byte in frame.pixels.iter_mut() {
                        *byte = (*byte / step) * step;
                    }
                    for byte in frame.color.iter_mut() {
                        *byte = (*byte / step) * step;
                    }
                }
                Ok(ChainOutcome::InPlace)
            }
        }
    }

    fn pixels_equal(&self, left: RasterId, right: RasterId) -> Result<bool, EngineError> {
        let mut state = self.lock();
        if let Some(message) = take_failure(&mut state, "compare") {
            return Err(EngineError::Native { message });
        }
        let lhs = frame(&state, left)?;
        let rhs = frame(&state, right)?;
        Ok(lhs.width == rhs.width && lhs.height == rhs.height && lhs.pixels == rhs.pixels)
    }

    fn limit(&self, kind: LimitKind) -> u64 {
        self.lock()
            .limits
            .get(&kind)
            .copied()
            .unwrap_or_else(|| default_limit(kind))
    }

    fn set_limit(&self, kind: LimitKind, value: u64) {
        self.lock().limits.insert(kind, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effigy_engine::{NullSink, ResourceLimits};

    /// Records warnings and progress; can cancel after a given tick.
    #[derive(Default)]
    struct Recorder {
        warnings: Vec<Warning>,
        ticks: u64,
        cancel_after: Option<u64>,
    }

    impl EventSink for Recorder {
        fn warning(&mut self, warning: &Warning) {
            self.warnings.push(warning.clone());
        }

        fn progress(&mut self, _progress: &Progress) -> bool {
            self.ticks += 1;
            self.cancel_after.map_or(true, |limit| self.ticks <= limit)
        }
    }

    fn solid(engine: &TestEngine, color: [u8; 4]) -> RasterId {
        engine
            .create(&RasterSpec::solid(1, 1, color))
            .expect("create")
    }

    fn link(engine: &TestEngine, ids: &[RasterId]) {
        for pair in ids.windows(2) {
            engine.set_next(pair[0], Some(pair[1])).expect("link");
        }
    }

    #[test]
    fn release_accounting() -> Result<(), EngineError> {
        let engine = TestEngine::new();
        let id = solid(&engine, [1, 2, 3, 255]);
        assert_eq!(engine.live_count(), 1);

        engine.release(id)?;
        assert_eq!(engine.live_count(), 0);
        assert_eq!(engine.released(), vec![id]);

        assert_eq!(engine.release(id), Err(EngineError::UnknownHandle(id)));
        Ok(())
    }

    #[test]
    fn chain_walk_follows_next_links() -> Result<(), EngineError> {
        let engine = TestEngine::new();
        let ids: Vec<_> = (0..3).map(|_| solid(&engine, [0; 4])).collect();
        link(&engine, &ids);

        let payload = engine.write(ids[0], &SettingsPayload::default(), &mut NullSink)?;
        let (_, frames) = payload::decode(&payload)?;
        assert_eq!(frames.len(), 3);
        Ok(())
    }

    #[test]
    fn morph_inserts_frames_between_pairs() -> Result<(), EngineError> {
        let engine = TestEngine::new();
        let ids: Vec<_> = (0..3).map(|_| solid(&engine, [9, 9, 9, 255])).collect();
        link(&engine, &ids);

        let outcome = engine.run_chain(
            ids[0],
            &ChainOp::Morph { frames: 2 },
            &SettingsPayload::default(),
            &mut NullSink,
        )?;
        match outcome {
            // 3 originals + 2 pairs * 2 in-betweens
            ChainOutcome::Frames(frames) => assert_eq!(frames.len(), 7),
            ChainOutcome::InPlace => panic!("morph must produce frames"),
        }
        Ok(())
    }

    #[test]
    fn quantize_mutates_in_place() -> Result<(), EngineError> {
        let engine = TestEngine::new();
        let id = solid(&engine, [255, 130, 7, 255]);

        let outcome = engine.run_chain(
            id,
            &ChainOp::Quantize(Default::default()),
            &SettingsPayload::default(),
            &mut NullSink,
        )?;
        assert_eq!(outcome, ChainOutcome::InPlace);
        assert_eq!(engine.live_count(), 1);
        Ok(())
    }

    #[test]
    fn scripted_failure_fires_once() {
        let engine = TestEngine::new();
        let id = solid(&engine, [0; 4]);
        engine.fail_next("coalesce", "stream exhausted");

        let first = engine.run_chain(
            id,
            &ChainOp::Coalesce,
            &SettingsPayload::default(),
            &mut NullSink,
        );
        assert_eq!(
            first,
            Err(EngineError::Native {
                message: "stream exhausted".into()
            })
        );

        let second = engine.run_chain(
            id,
            &ChainOp::Coalesce,
            &SettingsPayload::default(),
            &mut NullSink,
        );
        assert!(second.is_ok());
    }

    #[test]
    fn scripted_warning_reaches_the_sink() -> Result<(), EngineError> {
        let engine = TestEngine::new();
        let id = solid(&engine, [0; 4]);
        engine.warn_on("flatten", "colors clipped");

        let mut recorder = Recorder::default();
        engine.run_chain(
            id,
            &ChainOp::Flatten,
            &SettingsPayload::default(),
            &mut recorder,
        )?;
        assert_eq!(recorder.warnings.len(), 1);
        assert_eq!(recorder.warnings[0].message, "colors clipped");
        Ok(())
    }

    #[test]
    fn progress_cancel_stops_the_call() {
        let engine = TestEngine::new();
        let id = solid(&engine, [0; 4]);
        engine.set_progress_ticks(5);

        let mut recorder = Recorder {
            cancel_after: Some(2),
            ..Recorder::default()
        };
        let result = engine.run_chain(
            id,
            &ChainOp::Optimize,
            &SettingsPayload::default(),
            &mut recorder,
        );
        assert_eq!(result, Err(EngineError::Cancelled));
        assert_eq!(recorder.ticks, 3);
    }

    #[test]
    fn read_honors_the_frame_window() -> Result<(), EngineError> {
        let engine = TestEngine::new();
        let frames: Vec<_> = (0u8..4)
            .map(|n| FrameSpec::solid(1, 1, [n, n, n, 255]))
            .collect();
        let bytes = payload::encode(Format::Gif, &frames);

        let options = ReadOptions {
            frame_index: Some(1),
            frame_count: Some(2),
            ..ReadOptions::default()
        };
        let ids = engine.read(&bytes, &options, &mut NullSink)?;
        assert_eq!(ids.len(), 2);
        assert_eq!(engine.color(ids[0]), Some([1, 1, 1, 255]));
        Ok(())
    }

    #[test]
    fn resource_limits_round_trip_through_the_engine() {
        let engine = TestEngine::shared();
        let limits = ResourceLimits::new(Arc::clone(&engine) as Arc<dyn RasterEngine>);

        assert_eq!(limits.thread(), 4);
        limits.set_memory(1024);
        assert_eq!(limits.memory(), 1024);
        assert_eq!(limits.get(LimitKind::Memory), 1024);
    }

    #[test]
    fn format_info_reports_codec_capabilities() {
        let engine = TestEngine::new();

        let gif = engine.format_info(Format::Gif).expect("gif codec");
        assert!(gif.supports_multiple_frames);
        assert!(gif.readable && gif.writable);
        assert_eq!(gif.mime_type, "image/gif");

        let jpeg = engine.format_info(Format::Jpeg).expect("jpeg codec");
        assert!(!jpeg.supports_multiple_frames);

        assert!(engine.format_info(Format::Unknown).is_none());
        assert_eq!(engine.quantum().max, 255);
    }

    #[test]
    fn append_sums_the_horizontal_axis() -> Result<(), EngineError> {
        let engine = TestEngine::new();
        let a = engine.create(&RasterSpec::solid(2, 5, [0; 4]))?;
        let b = engine.create(&RasterSpec::solid(3, 4, [0; 4]))?;
        engine.set_next(a, Some(b))?;

        let outcome = engine.run_chain(
            a,
            &ChainOp::Append { vertically: false },
            &SettingsPayload::default(),
            &mut NullSink,
        )?;
        let ChainOutcome::Frames(ids) = outcome else {
            panic!("append must produce a frame");
        };
        assert_eq!(engine.dimensions(ids[0]), Some((5, 5)));
        Ok(())
    }
}
