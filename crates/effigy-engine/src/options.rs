use crate::handle::RasterId;
use crate::info::Format;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options consumed by the engine's read entry point.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReadOptions {
    /// Format hint overriding signature detection.
    pub format: Option<Format>,
    /// Zero-based index of the first frame to decode.
    pub frame_index: Option<u32>,
    /// Number of frames to decode, starting at `frame_index`.
    pub frame_count: Option<u32>,
    /// Requested decode width, for codecs that can scale while decoding.
    pub width: Option<u32>,
    /// Requested decode height.
    pub height: Option<u32>,
}

/// Color-reduction options for the quantize chain operation.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuantizeOptions {
    /// Target number of colors.
    pub colors: u32,
    /// Color tree depth, 0 lets the engine choose, at most 8.
    pub tree_depth: u32,
    /// Apply error diffusion while remapping.
    pub dither: bool,
    /// Ask the engine to measure and report the quantization error.
    pub measure_errors: bool,
}

impl Default for QuantizeOptions {
    fn default() -> Self {
        Self {
            colors: 256,
            tree_depth: 0,
            dither: true,
            measure_errors: false,
        }
    }
}

/// Vector drawing options mirrored to the engine with every call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DrawOptions {
    /// Stroke width in pixels.
    pub stroke_width: f64,
    /// Fill opacity, 0.0 (transparent) to 1.0 (opaque).
    pub fill_opacity: f64,
    /// Anti-alias drawn edges.
    pub antialias: bool,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            stroke_width: 1.0,
            fill_opacity: 1.0,
            antialias: true,
        }
    }
}

/// The settings snapshot pushed to the engine with every operation that
/// consumes settings.
///
/// Rebuilt from the managed cache per call, so the managed and engine-side
/// views cannot drift apart between calls.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SettingsPayload {
    /// Output format override.
    pub format: Option<Format>,
    /// Encoding quality, 1 to 100.
    pub quality: u32,
    /// Color match tolerance as a percentage.
    pub fuzz: f64,
    /// Channel depth in bits.
    pub depth: u32,
    /// Drawing options group.
    pub draw: DrawOptions,
}

impl Default for SettingsPayload {
    fn default() -> Self {
        Self {
            format: None,
            quality: 92,
            fuzz: 0.0,
            depth: 8,
            draw: DrawOptions::default(),
        }
    }
}

/// Single-image operations forwarded to the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum RasterOp {
    /// Scale to the given dimensions.
    Resize {
        /// Target width in pixels.
        width: u32,
        /// Target height in pixels.
        height: u32,
    },
    /// Extract a sub-region.
    Crop {
        /// Left edge of the region.
        x: u32,
        /// Top edge of the region.
        y: u32,
        /// Region width in pixels.
        width: u32,
        /// Region height in pixels.
        height: u32,
    },
    /// Mirror vertically.
    Flip,
    /// Mirror horizontally.
    Flop,
    /// Rotate by the given angle.
    Rotate {
        /// Rotation in degrees, clockwise.
        degrees: f64,
    },
}

impl RasterOp {
    /// Stable operation name, used as the progress origin and in test
    /// scripting.
    pub fn name(&self) -> &'static str {
        match self {
            RasterOp::Resize { .. } => "resize",
            RasterOp::Crop { .. } => "crop",
            RasterOp::Flip => "flip",
            RasterOp::Flop => "flop",
            RasterOp::Rotate { .. } => "rotate",
        }
    }
}

/// Whole-chain operations. The engine walks the singly linked list rooted at
/// the head raster it is handed.
#[derive(Clone, Debug, PartialEq)]
pub enum ChainOp {
    /// Concatenate all frames edge to edge into one raster.
    Append {
        /// Stack top-to-bottom instead of left-to-right.
        vertically: bool,
    },
    /// Expand every frame to full size against its predecessors.
    Coalesce,
    /// Interpret each frame as one channel of a single result.
    Combine,
    /// Reduce frames to their differences from the previous frame.
    Deconstruct,
    /// Merge all frames onto an opaque canvas.
    Flatten,
    /// Merge all frames honoring their page offsets.
    Merge,
    /// Insert interpolated frames between each successive pair.
    Morph {
        /// Number of in-between frames per pair.
        frames: u32,
    },
    /// Merge onto a canvas sized to the union of all page offsets.
    Mosaic,
    /// Reduce frames to the smallest changed region per frame.
    Optimize,
    /// Additionally turn unchanged pixels transparent.
    OptimizeTransparency,
    /// Reduce the chain to a shared limited palette, in place.
    Quantize(QuantizeOptions),
    /// Concatenate frames with a fixed gap between them.
    Smush {
        /// Gap between frames in pixels; negative overlaps.
        offset: i32,
        /// Stack top-to-bottom instead of left-to-right.
        vertically: bool,
    },
}

impl ChainOp {
    /// Stable operation name, used as the progress origin and in test
    /// scripting.
    pub fn name(&self) -> &'static str {
        match self {
            ChainOp::Append { .. } => "append",
            ChainOp::Coalesce => "coalesce",
            ChainOp::Combine => "combine",
            ChainOp::Deconstruct => "deconstruct",
            ChainOp::Flatten => "flatten",
            ChainOp::Merge => "merge",
            ChainOp::Morph { .. } => "morph",
            ChainOp::Mosaic => "mosaic",
            ChainOp::Optimize => "optimize",
            ChainOp::OptimizeTransparency => "optimize-transparency",
            ChainOp::Quantize(_) => "quantize",
            ChainOp::Smush { .. } => "smush",
        }
    }
}

/// What a chain operation produced.
#[derive(Clone, Debug, PartialEq)]
pub enum ChainOutcome {
    /// The operation produced new rasters the caller now owns, in order.
    Frames(Vec<RasterId>),
    /// The operation mutated the chained rasters in place.
    InPlace,
}
