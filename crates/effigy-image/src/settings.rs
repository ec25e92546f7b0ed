use effigy_engine::{DrawOptions, Format, QuantizeOptions, ReadOptions, SettingsPayload};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ImageError;

/// Managed settings cache for one image entity.
///
/// Values are validated before they are stored, so an invalid value is
/// rejected with [`ImageError::InvalidConfiguration`] and the previously
/// cached value stays in place. The engine-facing [`SettingsPayload`] is
/// rebuilt from this cache by [`snapshot`](Self::snapshot) on every call
/// that consumes settings, so the managed and engine-side views cannot
/// drift apart between calls.
///
/// Cloning is a deep copy including every nested option group; two entities
/// never share a mutable settings object.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ImageSettings {
    format: Option<Format>,
    quality: u32,
    fuzz: f64,
    depth: u32,
    read: ReadOptions,
    quantize: QuantizeOptions,
    draw: DrawOptions,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            format: None,
            quality: 92,
            fuzz: 0.0,
            depth: 8,
            read: ReadOptions::default(),
            quantize: QuantizeOptions::default(),
            draw: DrawOptions::default(),
        }
    }
}

impl ImageSettings {
    /// Settings with engine defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Output format override; `None` keeps the source format.
    pub fn format(&self) -> Option<Format> {
        self.format
    }

    /// Sets or clears the output format override.
    pub fn set_format(&mut self, format: Option<Format>) {
        self.format = format;
    }

    /// Encoding quality.
    pub fn quality(&self) -> u32 {
        self.quality
    }

    /// Sets the encoding quality.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidConfiguration`] outside `1..=100`; the cached
    /// value is unchanged.
    pub fn set_quality(&mut self, quality: u32) -> Result<(), ImageError> {
        if !(1..=100).contains(&quality) {
            return Err(ImageError::InvalidConfiguration(format!(
                "quality must be within 1..=100, got {quality}"
            )));
        }
        self.quality = quality;
        Ok(())
    }

    /// Color match tolerance as a percentage.
    pub fn fuzz(&self) -> f64 {
        self.fuzz
    }

    /// Sets the color match tolerance.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidConfiguration`] when the value is not a finite
    /// percentage in `0.0..=100.0`.
    pub fn set_fuzz(&mut self, fuzz: f64) -> Result<(), ImageError> {
        if !fuzz.is_finite() || !(0.0..=100.0).contains(&fuzz) {
            return Err(ImageError::InvalidConfiguration(format!(
                "fuzz must be a percentage within 0.0..=100.0, got {fuzz}"
            )));
        }
        self.fuzz = fuzz;
        Ok(())
    }

    /// Channel depth in bits.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Sets the channel depth.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidConfiguration`] outside `1..=64`.
    pub fn set_depth(&mut self, depth: u32) -> Result<(), ImageError> {
        if !(1..=64).contains(&depth) {
            return Err(ImageError::InvalidConfiguration(format!(
                "depth must be within 1..=64 bits, got {depth}"
            )));
        }
        self.depth = depth;
        Ok(())
    }

    /// Decode options used by read operations.
    pub fn read_options(&self) -> &ReadOptions {
        &self.read
    }

    /// Mutable decode options. Every field is optional, so there is no
    /// invalid state to guard against.
    pub fn read_options_mut(&mut self) -> &mut ReadOptions {
        &mut self.read
    }

    /// Color-reduction options used by quantize operations.
    pub fn quantize(&self) -> &QuantizeOptions {
        &self.quantize
    }

    /// Replaces the quantize option group.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidConfiguration`] when the group fails validation;
    /// the cached group is unchanged.
    pub fn set_quantize(&mut self, options: QuantizeOptions) -> Result<(), ImageError> {
        validate_quantize(&options)?;
        self.quantize = options;
        Ok(())
    }

    /// Drawing options mirrored to the engine with every call.
    pub fn draw(&self) -> &DrawOptions {
        &self.draw
    }

    /// Replaces the drawing option group.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidConfiguration`] when the group fails validation;
    /// the cached group is unchanged.
    pub fn set_draw(&mut self, options: DrawOptions) -> Result<(), ImageError> {
        if !options.stroke_width.is_finite() || options.stroke_width < 0.0 {
            return Err(ImageError::InvalidConfiguration(format!(
                "stroke width must be finite and non-negative, got {}",
                options.stroke_width
            )));
        }
        if !options.fill_opacity.is_finite() || !(0.0..=1.0).contains(&options.fill_opacity) {
            return Err(ImageError::InvalidConfiguration(format!(
                "fill opacity must be within 0.0..=1.0, got {}",
                options.fill_opacity
            )));
        }
        self.draw = options;
        Ok(())
    }

    /// Builds the payload pushed to the engine for the next call.
    pub fn snapshot(&self) -> SettingsPayload {
        SettingsPayload {
            format: self.format,
            quality: self.quality,
            fuzz: self.fuzz,
            depth: self.depth,
            draw: self.draw.clone(),
        }
    }
}

/// Validates a quantize option group ahead of any engine call.
pub(crate) fn validate_quantize(options: &QuantizeOptions) -> Result<(), ImageError> {
    if options.colors == 0 {
        return Err(ImageError::InvalidConfiguration(
            "quantize colors must be at least 1".into(),
        ));
    }
    if options.tree_depth > 8 {
        return Err(ImageError::InvalidConfiguration(format!(
            "quantize tree depth must be at most 8, got {}",
            options.tree_depth
        )));
    }
    Ok(())
}
