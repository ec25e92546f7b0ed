use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// File formats the binding layer can name.
///
/// The engine owns the actual codecs; this enum only names them so settings
/// and metadata can refer to a format without string plumbing. Formats the
/// binding does not know map to [`Format::Unknown`] and are passed through
/// untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// Windows bitmap.
    Bmp,
    /// Graphics interchange format.
    Gif,
    /// Joint Photographic Experts Group.
    Jpeg,
    /// Portable network graphics.
    Png,
    /// Tagged image file format.
    Tiff,
    /// WebP.
    WebP,
    /// Not recognized by the binding layer.
    #[default]
    Unknown,
}

impl Format {
    /// Canonical lowercase name of the format.
    pub fn name(&self) -> &'static str {
        match self {
            Format::Bmp => "bmp",
            Format::Gif => "gif",
            Format::Jpeg => "jpeg",
            Format::Png => "png",
            Format::Tiff => "tiff",
            Format::WebP => "webp",
            Format::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = std::convert::Infallible;

    /// Case-insensitive parse; unrecognized names become [`Format::Unknown`]
    /// rather than failing, matching how the engine treats format hints.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "bmp" => Format::Bmp,
            "gif" => Format::Gif,
            "jpg" | "jpeg" => Format::Jpeg,
            "png" => Format::Png,
            "tif" | "tiff" => Format::Tiff,
            "webp" => Format::WebP,
            _ => Format::Unknown,
        })
    }
}

/// Capabilities of a format, as reported by the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FormatInfo {
    /// The format described.
    pub format: Format,
    /// Human-readable description.
    pub description: String,
    /// MIME type, when the format has one.
    pub mime_type: String,
    /// Whether the engine can decode this format.
    pub readable: bool,
    /// Whether the engine can encode this format.
    pub writable: bool,
    /// Whether a single file can carry more than one frame.
    pub supports_multiple_frames: bool,
}

/// Channel depth and maximum sample value of the engine build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuantumInfo {
    /// Bits per channel sample.
    pub depth: u32,
    /// Largest representable sample value.
    pub max: u64,
}

/// Per-resource metadata returned by
/// [`RasterEngine::describe`](crate::RasterEngine::describe).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RasterInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Format the resource was decoded from, or will encode to.
    pub format: Format,
    /// Inter-frame delay in ticks for animation formats, zero otherwise.
    pub frame_delay: u32,
}

impl RasterInfo {
    /// Total pixel count, the quantity the entity ordering compares by.
    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Construction request for a blank raster.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RasterSpec {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Background fill color, RGBA.
    pub background: [u8; 4],
    /// Format tag the new resource starts out with.
    pub format: Format,
}

impl RasterSpec {
    /// A solid-color canvas with no format assigned yet.
    pub fn solid(width: u32, height: u32, background: [u8; 4]) -> Self {
        Self {
            width,
            height,
            background,
            format: Format::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parse_is_case_insensitive() {
        assert_eq!("JPG".parse::<Format>(), Ok(Format::Jpeg));
        assert_eq!("Tiff".parse::<Format>(), Ok(Format::Tiff));
        assert_eq!("webp".parse::<Format>(), Ok(Format::WebP));
    }

    #[test]
    fn unrecognized_format_falls_back_to_unknown() {
        assert_eq!("xpm3".parse::<Format>(), Ok(Format::Unknown));
    }

    #[test]
    fn format_display_round_trips() {
        assert_eq!(Format::Png.to_string().parse::<Format>(), Ok(Format::Png));
    }

    #[test]
    fn pixel_count_does_not_overflow_u32() {
        let info = RasterInfo {
            width: u32::MAX,
            height: 2,
            format: Format::Unknown,
            frame_delay: 0,
        };
        assert_eq!(info.pixel_count(), u64::from(u32::MAX) * 2);
    }
}
