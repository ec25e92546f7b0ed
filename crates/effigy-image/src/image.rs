use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use effigy_engine::{
    EngineError, Format, Progress, RasterEngine, RasterHandle, RasterId, RasterInfo, RasterOp,
    RasterSpec, ReadOptions, Warning,
};

use crate::error::ImageError;
use crate::relay::Relay;
use crate::settings::ImageSettings;
use crate::source::ImageSource;

/// One image: an exclusively owned engine resource composed with its own
/// settings cache and observer relay.
///
/// Every mutating operation validates its arguments locally before touching
/// the engine and pushes the current settings snapshot with the call. When
/// the engine answers with a replacement resource, it is adopted in place so
/// references to this `Image` stay valid across the transform. Dropping the
/// image releases its resource deterministically.
pub struct Image {
    handle: RasterHandle,
    settings: ImageSettings,
    relay: Relay,
}

impl Image {
    /// Creates a blank canvas.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidArgument`] for zero dimensions, before any
    /// engine call; engine failures propagate.
    pub fn new(engine: Arc<dyn RasterEngine>, spec: &RasterSpec) -> Result<Self, ImageError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(ImageError::InvalidArgument(format!(
                "canvas dimensions must be non-zero, got {}x{}",
                spec.width, spec.height
            )));
        }
        let handle = RasterHandle::acquire(engine, |e| e.create(spec))?;
        let mut settings = ImageSettings::default();
        if spec.format != Format::Unknown {
            settings.set_format(Some(spec.format));
        }
        Ok(Self {
            handle,
            settings,
            relay: Relay::new(),
        })
    }

    /// Decodes a single image from `source`.
    ///
    /// Multi-frame inputs keep only the first frame; use
    /// [`ImageCollection::read`](crate::ImageCollection::read) to keep them
    /// all, or [`read_with`](Self::read_with) to select a frame window.
    pub fn read(
        engine: Arc<dyn RasterEngine>,
        source: impl Into<ImageSource>,
    ) -> Result<Self, ImageError> {
        Self::read_with(engine, source, &ReadOptions::default())
    }

    /// Decodes a single image with explicit read options.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidArgument`] for an empty payload,
    /// [`ImageError::Io`] when the source cannot be read, and engine decode
    /// failures verbatim.
    pub fn read_with(
        engine: Arc<dyn RasterEngine>,
        source: impl Into<ImageSource>,
        options: &ReadOptions,
    ) -> Result<Self, ImageError> {
        let bytes = source.into().into_bytes()?;
        if bytes.is_empty() {
            return Err(ImageError::InvalidArgument("input payload is empty".into()));
        }

        let mut relay = Relay::new();
        let ids = engine.read(&bytes, options, &mut relay)?;
        let mut ids = ids.into_iter();
        let first = ids.next().ok_or_else(|| {
            ImageError::Engine(EngineError::Contract("read returned no frames".into()))
        })?;
        // Single-image read: surplus frames go straight back to the engine.
        for surplus in ids {
            if let Err(err) = engine.release(surplus) {
                log::warn!("failed to release surplus frame {surplus}: {err}");
            }
        }

        let handle = RasterHandle::adopt(engine, first);
        let mut image = Self {
            handle,
            settings: ImageSettings::default(),
            relay,
        };
        let format = image.info()?.format;
        if format != Format::Unknown {
            image.settings.set_format(Some(format));
        }
        Ok(image)
    }

    /// Wraps a resource the engine just handed out, taking exclusive
    /// ownership. This is the constructor for ids returned by engine
    /// operations; the new image releases the resource when dropped.
    pub fn adopt(engine: Arc<dyn RasterEngine>, id: RasterId) -> Self {
        Self::adopt_with_settings(engine, id, ImageSettings::default())
    }

    pub(crate) fn adopt_with_settings(
        engine: Arc<dyn RasterEngine>,
        id: RasterId,
        settings: ImageSettings,
    ) -> Self {
        Self {
            handle: RasterHandle::adopt(engine, id),
            settings,
            relay: Relay::new(),
        }
    }

    /// The id the engine knows this image by.
    ///
    /// # Errors
    ///
    /// [`EngineError::Disposed`] when the underlying handle was released.
    pub fn raster_id(&self) -> Result<RasterId, ImageError> {
        Ok(self.handle.id()?)
    }

    /// The engine this image lives in.
    pub fn engine(&self) -> &Arc<dyn RasterEngine> {
        self.handle.engine()
    }

    /// The settings cache.
    pub fn settings(&self) -> &ImageSettings {
        &self.settings
    }

    /// Mutable access to the settings cache.
    pub fn settings_mut(&mut self) -> &mut ImageSettings {
        &mut self.settings
    }

    /// Registers the warning observer for this image's engine calls,
    /// replacing any previous one.
    pub fn on_warning(&mut self, handler: impl FnMut(&Warning) + Send + 'static) {
        self.relay.set_warning_handler(handler);
    }

    /// Registers the progress observer for this image's engine calls,
    /// replacing any previous one. Returning `false` from the handler
    /// requests cooperative cancellation.
    pub fn on_progress(&mut self, handler: impl FnMut(&Progress) -> bool + Send + 'static) {
        self.relay.set_progress_handler(handler);
    }

    /// Current engine-side metadata.
    pub fn info(&self) -> Result<RasterInfo, ImageError> {
        let id = self.handle.id()?;
        Ok(self.handle.engine().describe(id)?)
    }

    /// Width in pixels.
    pub fn width(&self) -> Result<u32, ImageError> {
        Ok(self.info()?.width)
    }

    /// Height in pixels.
    pub fn height(&self) -> Result<u32, ImageError> {
        Ok(self.info()?.height)
    }

    /// Total pixel count, the size-only ordering key.
    pub fn pixel_count(&self) -> Result<u64, ImageError> {
        Ok(self.info()?.pixel_count())
    }

    /// Forwards one operation, adopting the replacement resource when the
    /// engine produces one.
    fn forward(&mut self, op: &RasterOp) -> Result<(), ImageError> {
        let id = self.handle.id()?;
        let payload = self.settings.snapshot();
        let engine = Arc::clone(self.handle.engine());
        if let Some(replacement) = engine.apply(id, op, &payload, &mut self.relay)? {
            self.handle.replace(replacement)?;
        }
        Ok(())
    }

    /// Scales the image to the given dimensions.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidArgument`] for zero dimensions, before any
    /// engine call.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidArgument(format!(
                "resize dimensions must be non-zero, got {width}x{height}"
            )));
        }
        self.forward(&RasterOp::Resize { width, height })
    }

    /// Extracts a sub-region.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidArgument`] for an empty region, before any
    /// engine call.
    pub fn crop(&mut self, x: u32, y: u32, width: u32, height: u32) -> Result<(), ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidArgument(format!(
                "crop region must be non-empty, got {width}x{height}"
            )));
        }
        self.forward(&RasterOp::Crop {
            x,
            y,
            width,
            height,
        })
    }

    /// Mirrors the image vertically.
    pub fn flip(&mut self) -> Result<(), ImageError> {
        self.forward(&RasterOp::Flip)
    }

    /// Mirrors the image horizontally.
    pub fn flop(&mut self) -> Result<(), ImageError> {
        self.forward(&RasterOp::Flop)
    }

    /// Rotates by the given angle in degrees, clockwise.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidArgument`] for a non-finite angle.
    pub fn rotate(&mut self, degrees: f64) -> Result<(), ImageError> {
        if !degrees.is_finite() {
            return Err(ImageError::InvalidArgument(format!(
                "rotation angle must be finite, got {degrees}"
            )));
        }
        self.forward(&RasterOp::Rotate { degrees })
    }

    /// Encodes the image using the current settings.
    pub fn write(&mut self) -> Result<Vec<u8>, ImageError> {
        let id = self.handle.id()?;
        let payload = self.settings.snapshot();
        let engine = Arc::clone(self.handle.engine());
        Ok(engine.write(id, &payload, &mut self.relay)?)
    }

    /// Encodes the image and writes the payload to `path`.
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let bytes = self.write()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// A true engine-level duplicate: the copy owns a fresh resource and a
    /// deep copy of the settings. Registered observers do not transfer.
    pub fn try_clone(&self) -> Result<Self, ImageError> {
        let id = self.handle.id()?;
        let engine = Arc::clone(self.handle.engine());
        let copy = engine.clone_raster(id)?;
        Ok(Self {
            handle: RasterHandle::adopt(engine, copy),
            settings: self.settings.clone(),
            relay: Relay::new(),
        })
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("handle", &self.handle)
            .field("settings", &self.settings)
            .finish()
    }
}

/// Two images are equal only when their dimensions match and the engine
/// reports pixel-level equality. A failed engine comparison (including
/// comparing images from different engines) compares unequal.
impl PartialEq for Image {
    fn eq(&self, other: &Self) -> bool {
        let (Ok(lhs), Ok(rhs)) = (self.info(), other.info()) else {
            return false;
        };
        if lhs.width != rhs.width || lhs.height != rhs.height {
            return false;
        }
        let (Ok(left), Ok(right)) = (self.handle.id(), other.handle.id()) else {
            return false;
        };
        self.handle
            .engine()
            .pixels_equal(left, right)
            .unwrap_or(false)
    }
}

/// Weak, size-only ordering: images compare by pixel count (width × height)
/// alone, never by content. Two different pictures of equal area order as
/// equal here while `==` still reports them distinct; consumers expecting a
/// content ordering must compare pixels themselves. `None` when either
/// image's metadata cannot be read.
impl PartialOrd for Image {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let lhs = self.pixel_count().ok()?;
        let rhs = other.pixel_count().ok()?;
        Some(lhs.cmp(&rhs))
    }
}

#[cfg(test)]
mod tests {
    use effigy_test::{payload, FrameSpec, TestEngine};

    use super::*;

    fn canvas(engine: &Arc<TestEngine>, width: u32, height: u32, color: [u8; 4]) -> Image {
        Image::new(
            Arc::clone(engine) as Arc<dyn RasterEngine>,
            &RasterSpec::solid(width, height, color),
        )
        .expect("create canvas")
    }

    #[test]
    fn zero_sized_canvas_is_rejected_before_the_engine() {
        let engine = TestEngine::shared();
        let result = Image::new(
            Arc::clone(&engine) as Arc<dyn RasterEngine>,
            &RasterSpec::solid(0, 4, [0; 4]),
        );
        assert!(matches!(result, Err(ImageError::InvalidArgument(_))));
        assert_eq!(engine.total_created(), 0);
    }

    #[test]
    fn clone_owns_a_distinct_resource_and_settings() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let mut original = canvas(&engine, 2, 2, [1, 2, 3, 255]);
        original.settings_mut().set_quality(55)?;

        let copy = original.try_clone()?;
        assert_ne!(original.raster_id()?, copy.raster_id()?);
        assert_eq!(copy.settings(), original.settings());

        original.settings_mut().set_quality(80)?;
        assert_eq!(copy.settings().quality(), 55);
        Ok(())
    }

    #[test]
    fn equality_requires_matching_pixels() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let red_one = canvas(&engine, 1, 1, [255, 0, 0, 255]);
        let red_two = canvas(&engine, 1, 1, [255, 0, 0, 255]);
        let blue = canvas(&engine, 1, 1, [0, 0, 255, 255]);
        let wide = canvas(&engine, 2, 1, [255, 0, 0, 255]);

        assert_eq!(red_one, red_two);
        assert_ne!(red_one, blue);
        assert_ne!(red_one, wide);
        Ok(())
    }

    #[test]
    fn ordering_is_by_pixel_count_only() {
        let engine = TestEngine::shared();
        let small = canvas(&engine, 1, 1, [0; 4]);
        let large = canvas(&engine, 3, 3, [0; 4]);
        let other_small = canvas(&engine, 1, 1, [9, 9, 9, 255]);

        assert_eq!(small.partial_cmp(&large), Some(Ordering::Less));
        assert_eq!(large.partial_cmp(&small), Some(Ordering::Greater));
        // Same area orders equal even though the contents differ.
        assert_eq!(small.partial_cmp(&other_small), Some(Ordering::Equal));
        assert_ne!(small, other_small);
    }

    #[test]
    fn resize_adopts_the_replacement_resource() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let mut image = canvas(&engine, 4, 4, [0; 4]);
        let before = image.raster_id()?;

        image.resize(8, 2)?;

        assert_ne!(image.raster_id()?, before);
        assert_eq!(image.width()?, 8);
        assert_eq!(image.height()?, 2);
        assert!(engine.released().contains(&before));
        assert_eq!(engine.live_count(), 1);
        Ok(())
    }

    #[test]
    fn flip_mutates_in_place() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let mut image = canvas(&engine, 2, 2, [5, 5, 5, 255]);
        let before = image.raster_id()?;

        image.flip()?;

        assert_eq!(image.raster_id()?, before);
        assert_eq!(engine.live_count(), 1);
        Ok(())
    }

    #[test]
    fn invalid_resize_never_reaches_the_engine() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let mut image = canvas(&engine, 4, 4, [0; 4]);
        let created = engine.total_created();

        let result = image.resize(0, 10);
        assert!(matches!(result, Err(ImageError::InvalidArgument(_))));
        assert_eq!(engine.total_created(), created);
        assert_eq!(image.width()?, 4);
        Ok(())
    }

    #[test]
    fn read_keeps_the_first_frame_and_releases_the_rest() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let frames = vec![
            FrameSpec::solid(2, 2, [1, 1, 1, 255]),
            FrameSpec::solid(3, 3, [2, 2, 2, 255]),
        ];
        let bytes = payload::encode(Format::Gif, &frames);

        let image = Image::read(Arc::clone(&engine) as Arc<dyn RasterEngine>, bytes)?;
        assert_eq!(image.width()?, 2);
        assert_eq!(image.settings().format(), Some(Format::Gif));
        assert_eq!(engine.live_count(), 1);
        Ok(())
    }

    #[test]
    fn empty_payload_is_rejected_locally() {
        let engine = TestEngine::shared();
        let result = Image::read(Arc::clone(&engine) as Arc<dyn RasterEngine>, Vec::new());
        assert!(matches!(result, Err(ImageError::InvalidArgument(_))));
    }

    #[test]
    fn write_to_file_round_trips_through_a_path() -> Result<(), Box<dyn std::error::Error>> {
        let engine = TestEngine::shared();
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("canvas.efx");

        let mut image = canvas(&engine, 5, 7, [8, 8, 8, 255]);
        image.write_to_file(&path)?;

        let back = Image::read(Arc::clone(&engine) as Arc<dyn RasterEngine>, path.as_path())?;
        assert_eq!(back.width()?, 5);
        assert_eq!(back.height()?, 7);
        Ok(())
    }

    #[test]
    fn drop_releases_the_resource() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let id = {
            let image = canvas(&engine, 1, 1, [0; 4]);
            image.raster_id()?
        };
        assert_eq!(engine.live_count(), 0);
        assert_eq!(engine.released(), vec![id]);
        Ok(())
    }

    #[test]
    fn warning_during_an_operation_is_observed_and_the_call_succeeds() -> Result<(), ImageError> {
        use std::sync::Mutex;

        let engine = TestEngine::shared();
        engine.warn_on("resize", "interpolation fallback");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let mut image = canvas(&engine, 4, 4, [0; 4]);
        image.on_warning(move |warning| sink.lock().unwrap().push(warning.message.clone()));

        image.resize(2, 2)?;
        assert_eq!(*seen.lock().unwrap(), vec!["interpolation fallback"]);
        assert_eq!(image.width()?, 2);
        Ok(())
    }
}
