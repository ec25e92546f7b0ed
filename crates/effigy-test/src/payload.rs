//! The trivial wire format the test engine reads and writes.
//!
//! Layout, all integers big-endian: the magic `EFX1`, a format tag byte, a
//! `u32` frame count, then per frame `width: u32`, `height: u32`,
//! `color: [u8; 4]`, `delay: u32`. Just enough structure to exercise the
//! read/write contract, frame windows and malformed-input failures.

use effigy_engine::{EngineError, Format};

/// Magic bytes opening every payload.
pub const MAGIC: [u8; 4] = *b"EFX1";

const FRAME_RECORD_LEN: usize = 16;

/// One frame as carried by the wire format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSpec {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Solid fill color, RGBA.
    pub color: [u8; 4],
    /// Inter-frame delay in ticks.
    pub delay: u32,
}

impl FrameSpec {
    /// A solid frame with no delay.
    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        Self {
            width,
            height,
            color,
            delay: 0,
        }
    }
}

fn format_tag(format: Format) -> u8 {
    match format {
        Format::Bmp => 1,
        Format::Gif => 2,
        Format::Jpeg => 3,
        Format::Png => 4,
        Format::Tiff => 5,
        Format::WebP => 6,
        Format::Unknown => 0,
    }
}

fn tag_format(tag: u8) -> Result<Format, EngineError> {
    Ok(match tag {
        0 => Format::Unknown,
        1 => Format::Bmp,
        2 => Format::Gif,
        3 => Format::Jpeg,
        4 => Format::Png,
        5 => Format::Tiff,
        6 => Format::WebP,
        other => {
            return Err(EngineError::native(format!(
                "unrecognized format tag {other}"
            )))
        }
    })
}

/// Encodes frames into a payload the test engine can read back.
pub fn encode(format: Format, frames: &[FrameSpec]) -> Vec<u8> {
    let mut out = Vec::with_capacity(9 + frames.len() * FRAME_RECORD_LEN);
    out.extend_from_slice(&MAGIC);
    out.push(format_tag(format));
    out.extend_from_slice(&(frames.len() as u32).to_be_bytes());
    for frame in frames {
        out.extend_from_slice(&frame.width.to_be_bytes());
        out.extend_from_slice(&frame.height.to_be_bytes());
        out.extend_from_slice(&frame.color);
        out.extend_from_slice(&frame.delay.to_be_bytes());
    }
    out
}

fn read_u32(payload: &[u8], at: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&payload[at..at + 4]);
    u32::from_be_bytes(bytes)
}

/// Decodes a payload into its format tag and frames.
///
/// # Errors
///
/// [`EngineError::Native`] with a diagnostic message when the magic, length
/// or format tag is wrong, mimicking a codec rejecting corrupt input.
pub fn decode(payload: &[u8]) -> Result<(Format, Vec<FrameSpec>), EngineError> {
    if payload.len() < 9 || payload[..4] != MAGIC {
        return Err(EngineError::native("unrecognized payload signature"));
    }
    let format = tag_format(payload[4])?;
    let count = read_u32(payload, 5) as usize;
    let body = &payload[9..];
    if body.len() != count * FRAME_RECORD_LEN {
        return Err(EngineError::native(format!(
            "truncated payload: expected {count} frame records"
        )));
    }
    let mut frames = Vec::with_capacity(count);
    for index in 0..count {
        let at = index * FRAME_RECORD_LEN;
        frames.push(FrameSpec {
            width: read_u32(body, at),
            height: read_u32(body, at + 4),
            color: [body[at + 8], body[at + 9], body[at + 10], body[at + 11]],
            delay: read_u32(body, at + 12),
        });
    }
    Ok((format, frames))
}
