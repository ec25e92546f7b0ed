use std::fmt;
use std::ops::{Index, IndexMut};
use std::path::Path;
use std::slice;
use std::sync::Arc;

use effigy_engine::{
    ChainOp, ChainOutcome, EngineError, Progress, QuantizeOptions, RasterEngine, RasterId,
    ReadOptions, Warning,
};

use crate::error::ImageError;
use crate::image::Image;
use crate::relay::Relay;
use crate::settings::validate_quantize;
use crate::source::ImageSource;

/// RAII attachment of a collection's images into the engine-side linked
/// list.
///
/// Links are threaded one by one on construction and every threaded id is
/// recorded, so when the guard drops (normally, or on an error anywhere
/// between attach and the end of the engine call) exactly the links that
/// were set get cleared again. The head's link is cleared along with the
/// rest: no raster keeps a next-link once the guard is gone, so later
/// sequence mutation cannot chain into stale engine pointers.
struct LinkedChain<'a> {
    engine: &'a dyn RasterEngine,
    linked: Vec<RasterId>,
}

impl<'a> LinkedChain<'a> {
    /// Threads `images[i] -> images[i+1]` for every adjacent pair and pins
    /// the last image's link to none.
    fn attach(engine: &'a dyn RasterEngine, images: &[Image]) -> Result<Self, ImageError> {
        let mut ids = Vec::with_capacity(images.len());
        for image in images {
            ids.push(image.raster_id()?);
        }

        let mut chain = Self {
            engine,
            linked: Vec::with_capacity(ids.len()),
        };
        for pair in ids.windows(2) {
            chain.engine.set_next(pair[0], Some(pair[1]))?;
            chain.linked.push(pair[0]);
        }
        if let Some(&last) = ids.last() {
            chain.engine.set_next(last, None)?;
            chain.linked.push(last);
        }
        Ok(chain)
    }
}

impl Drop for LinkedChain<'_> {
    fn drop(&mut self) {
        for &id in self.linked.iter().rev() {
            if let Err(err) = self.engine.set_next(id, None) {
                log::warn!("failed to clear next-link of raster {id}: {err}");
            }
        }
    }
}

/// An ordered sequence of images that can hand itself to engine operations
/// expecting a singly linked list rooted at the first image.
///
/// The sequence is index-addressable, duplicates are allowed and insertion
/// order is significant. Images are exclusively owned: moving one between
/// collections goes through [`remove`](Self::remove) and
/// [`push`](Self::push) without cloning, while
/// [`add_range`](Self::add_range) clones out of the source collection.
///
/// Batch operations thread the images into the engine's linked-list shape
/// for exactly one call and unthread them afterwards, even when the call
/// fails.
pub struct ImageCollection {
    engine: Arc<dyn RasterEngine>,
    images: Vec<Image>,
    relay: Relay,
}

impl ImageCollection {
    /// An empty collection bound to an engine.
    pub fn new(engine: Arc<dyn RasterEngine>) -> Self {
        Self {
            engine,
            images: Vec::new(),
            relay: Relay::new(),
        }
    }

    /// Decodes every frame of `source` into a new collection.
    pub fn from_source(
        engine: Arc<dyn RasterEngine>,
        source: impl Into<ImageSource>,
    ) -> Result<Self, ImageError> {
        let mut collection = Self::new(engine);
        collection.read(source)?;
        Ok(collection)
    }

    /// The engine this collection is bound to.
    pub fn engine(&self) -> &Arc<dyn RasterEngine> {
        &self.engine
    }

    /// Number of images.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    /// Whether the collection holds no images.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// The image at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&Image> {
        self.images.get(index)
    }

    /// Mutable access to the image at `index`, if any.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Image> {
        self.images.get_mut(index)
    }

    /// The first image, if any.
    pub fn first(&self) -> Option<&Image> {
        self.images.first()
    }

    /// The last image, if any.
    pub fn last(&self) -> Option<&Image> {
        self.images.last()
    }

    /// Iterates the images in order.
    pub fn iter(&self) -> slice::Iter<'_, Image> {
        self.images.iter()
    }

    /// Iterates the images in order, mutably.
    pub fn iter_mut(&mut self) -> slice::IterMut<'_, Image> {
        self.images.iter_mut()
    }

    /// Appends an image, taking ownership.
    pub fn push(&mut self, image: Image) {
        self.images.push(image);
    }

    /// Inserts an image at `index`.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidArgument`] when `index` is past the end.
    pub fn insert(&mut self, index: usize, image: Image) -> Result<(), ImageError> {
        if index > self.images.len() {
            return Err(ImageError::InvalidArgument(format!(
                "insert index {index} out of range for length {}",
                self.images.len()
            )));
        }
        self.images.insert(index, image);
        Ok(())
    }

    /// Removes and returns the image at `index`, without cloning. The caller
    /// now owns it; pushing it into another collection moves it there.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidArgument`] when `index` is out of range.
    pub fn remove(&mut self, index: usize) -> Result<Image, ImageError> {
        if index >= self.images.len() {
            return Err(ImageError::InvalidArgument(format!(
                "remove index {index} out of range for length {}",
                self.images.len()
            )));
        }
        Ok(self.images.remove(index))
    }

    /// Reverses the image order in place.
    pub fn reverse(&mut self) {
        self.images.reverse();
    }

    /// Appends clones of every image in `other`; the source collection keeps
    /// its images untouched.
    pub fn add_range(&mut self, other: &ImageCollection) -> Result<(), ImageError> {
        for image in other.iter() {
            self.images.push(image.try_clone()?);
        }
        Ok(())
    }

    /// Writes cloned images into `target`, never past
    /// `min(target.len(), len())` slots.
    ///
    /// # Returns
    ///
    /// The number of slots written.
    pub fn copy_to(&self, target: &mut [Option<Image>]) -> Result<usize, ImageError> {
        let count = target.len().min(self.images.len());
        for (slot, image) in target.iter_mut().zip(self.images.iter()) {
            *slot = Some(image.try_clone()?);
        }
        Ok(count)
    }

    /// Drops every image, releasing each native resource, and empties the
    /// sequence.
    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Registers the warning observer for this collection's engine calls,
    /// replacing any previous one.
    pub fn on_warning(&mut self, handler: impl FnMut(&Warning) + Send + 'static) {
        self.relay.set_warning_handler(handler);
    }

    /// Registers the progress observer for this collection's engine calls,
    /// replacing any previous one. Returning `false` from the handler
    /// requests cooperative cancellation.
    pub fn on_progress(&mut self, handler: impl FnMut(&Progress) -> bool + Send + 'static) {
        self.relay.set_progress_handler(handler);
    }

    /// Replaces the collection's contents with every frame decoded from
    /// `source`.
    ///
    /// On failure the current contents are left intact.
    pub fn read(&mut self, source: impl Into<ImageSource>) -> Result<(), ImageError> {
        self.read_with(source, &ReadOptions::default())
    }

    /// Replaces the collection's contents, decoding with explicit options.
    pub fn read_with(
        &mut self,
        source: impl Into<ImageSource>,
        options: &ReadOptions,
    ) -> Result<(), ImageError> {
        let bytes = source.into().into_bytes()?;
        if bytes.is_empty() {
            return Err(ImageError::InvalidArgument("input payload is empty".into()));
        }
        let ids = self.engine.read(&bytes, options, &mut self.relay)?;

        self.clear();
        for id in ids {
            self.images.push(Image::adopt(Arc::clone(&self.engine), id));
        }
        Ok(())
    }

    /// Encodes the whole sequence into one payload, using the first image's
    /// settings.
    pub fn write(&mut self) -> Result<Vec<u8>, ImageError> {
        self.ensure_at_least(1)?;
        let payload = self.images[0].settings().snapshot();
        let head = self.images[0].raster_id()?;

        let chain = LinkedChain::attach(self.engine.as_ref(), &self.images)?;
        let bytes = self.engine.write(head, &payload, &mut self.relay);
        drop(chain);
        Ok(bytes?)
    }

    /// Encodes the whole sequence and writes the payload to `path`.
    pub fn write_to_file(&mut self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        let bytes = self.write()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Joins all images left-to-right into one.
    pub fn append_horizontally(&mut self) -> Result<Image, ImageError> {
        self.merge_into_one(&ChainOp::Append { vertically: false })
    }

    /// Joins all images top-to-bottom into one.
    pub fn append_vertically(&mut self) -> Result<Image, ImageError> {
        self.merge_into_one(&ChainOp::Append { vertically: true })
    }

    /// Interprets each image as one channel of a single combined result.
    pub fn combine(&mut self) -> Result<Image, ImageError> {
        self.merge_into_one(&ChainOp::Combine)
    }

    /// Merges all images onto an opaque canvas.
    pub fn flatten(&mut self) -> Result<Image, ImageError> {
        self.merge_into_one(&ChainOp::Flatten)
    }

    /// Merges all images honoring their page offsets.
    pub fn merge(&mut self) -> Result<Image, ImageError> {
        self.merge_into_one(&ChainOp::Merge)
    }

    /// Merges onto a canvas sized to the union of all page offsets.
    pub fn mosaic(&mut self) -> Result<Image, ImageError> {
        self.merge_into_one(&ChainOp::Mosaic)
    }

    /// Joins all images with a fixed gap (negative overlaps) between them.
    pub fn smush(&mut self, offset: i32, vertically: bool) -> Result<Image, ImageError> {
        self.merge_into_one(&ChainOp::Smush { offset, vertically })
    }

    /// Expands every frame to full size against its predecessors, replacing
    /// the collection's contents with the result frames.
    pub fn coalesce(&mut self) -> Result<(), ImageError> {
        self.replace_contents(&ChainOp::Coalesce, 1)
    }

    /// Reduces frames to their differences from the previous frame,
    /// replacing the collection's contents.
    pub fn deconstruct(&mut self) -> Result<(), ImageError> {
        self.replace_contents(&ChainOp::Deconstruct, 1)
    }

    /// Inserts `frames` interpolated images between each successive pair,
    /// replacing the collection's contents.
    ///
    /// # Errors
    ///
    /// [`ImageError::InsufficientInput`] with a minimum of two: there is
    /// nothing to interpolate between otherwise.
    pub fn morph(&mut self, frames: u32) -> Result<(), ImageError> {
        self.replace_contents(&ChainOp::Morph { frames }, 2)
    }

    /// Reduces frames to the smallest changed region per frame, replacing
    /// the collection's contents.
    pub fn optimize(&mut self) -> Result<(), ImageError> {
        self.replace_contents(&ChainOp::Optimize, 1)
    }

    /// Like [`optimize`](Self::optimize), additionally turning unchanged
    /// pixels transparent.
    pub fn optimize_transparency(&mut self) -> Result<(), ImageError> {
        self.replace_contents(&ChainOp::OptimizeTransparency, 1)
    }

    /// Reduces the whole sequence to a shared limited palette, in place.
    ///
    /// # Errors
    ///
    /// [`ImageError::InvalidConfiguration`] when the options fail
    /// validation, before any engine call.
    pub fn quantize(&mut self, options: &QuantizeOptions) -> Result<(), ImageError> {
        validate_quantize(options)?;
        match self.run_chain(&ChainOp::Quantize(options.clone()), 1)? {
            ChainOutcome::InPlace => Ok(()),
            ChainOutcome::Frames(frames) => {
                self.release_surplus(frames);
                Err(ImageError::Engine(EngineError::Contract(
                    "quantize must run in place".into(),
                )))
            }
        }
    }

    fn ensure_at_least(&self, required: usize) -> Result<(), ImageError> {
        if self.images.len() < required {
            return Err(ImageError::InsufficientInput {
                required,
                actual: self.images.len(),
            });
        }
        Ok(())
    }

    /// Attaches, runs one chain call rooted at the first image, and
    /// detaches. The guard drops before the outcome is inspected, so links
    /// are cleared on success and failure alike.
    fn run_chain(&mut self, op: &ChainOp, required: usize) -> Result<ChainOutcome, ImageError> {
        self.ensure_at_least(required.max(1))?;
        let payload = self.images[0].settings().snapshot();
        let head = self.images[0].raster_id()?;

        let chain = LinkedChain::attach(self.engine.as_ref(), &self.images)?;
        let outcome = self.engine.run_chain(head, op, &payload, &mut self.relay);
        drop(chain);
        Ok(outcome?)
    }

    fn merge_into_one(&mut self, op: &ChainOp) -> Result<Image, ImageError> {
        let outcome = self.run_chain(op, 1)?;
        let ChainOutcome::Frames(frames) = outcome else {
            return Err(ImageError::Engine(EngineError::Contract(format!(
                "{} produced no result image",
                op.name()
            ))));
        };

        let mut frames = frames.into_iter();
        let first = frames.next().ok_or_else(|| {
            ImageError::Engine(EngineError::Contract(format!(
                "{} produced no result image",
                op.name()
            )))
        })?;
        self.release_surplus(frames.collect());

        let settings = self.images[0].settings().clone();
        Ok(Image::adopt_with_settings(
            Arc::clone(&self.engine),
            first,
            settings,
        ))
    }

    fn replace_contents(&mut self, op: &ChainOp, required: usize) -> Result<(), ImageError> {
        let outcome = self.run_chain(op, required)?;
        let ChainOutcome::Frames(frames) = outcome else {
            return Err(ImageError::Engine(EngineError::Contract(format!(
                "{} must produce result frames",
                op.name()
            ))));
        };

        let settings = self.images[0].settings().clone();
        self.clear();
        for id in frames {
            self.images.push(Image::adopt_with_settings(
                Arc::clone(&self.engine),
                id,
                settings.clone(),
            ));
        }
        Ok(())
    }

    /// Hands unexpected result frames straight back to the engine.
    fn release_surplus(&self, frames: Vec<RasterId>) {
        for id in frames {
            if let Err(err) = self.engine.release(id) {
                log::warn!("failed to release surplus frame {id}: {err}");
            }
        }
    }
}

impl Index<usize> for ImageCollection {
    type Output = Image;

    fn index(&self, index: usize) -> &Image {
        &self.images[index]
    }
}

impl IndexMut<usize> for ImageCollection {
    fn index_mut(&mut self, index: usize) -> &mut Image {
        &mut self.images[index]
    }
}

impl<'a> IntoIterator for &'a ImageCollection {
    type Item = &'a Image;
    type IntoIter = slice::Iter<'a, Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &'a mut ImageCollection {
    type Item = &'a mut Image;
    type IntoIter = slice::IterMut<'a, Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

impl IntoIterator for ImageCollection {
    type Item = Image;
    type IntoIter = std::vec::IntoIter<Image>;

    fn into_iter(self) -> Self::IntoIter {
        self.images.into_iter()
    }
}

impl fmt::Debug for ImageCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageCollection")
            .field("len", &self.images.len())
            .field("relay", &self.relay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use effigy_engine::{Format, RasterSpec};
    use effigy_test::{payload, FrameSpec, TestEngine};

    use super::*;

    fn engine_and_collection(count: usize) -> (Arc<TestEngine>, ImageCollection) {
        let engine = TestEngine::shared();
        let mut collection = ImageCollection::new(Arc::clone(&engine) as Arc<dyn RasterEngine>);
        for n in 0..count {
            let color = [n as u8, n as u8, n as u8, 255];
            let image = Image::new(
                Arc::clone(&engine) as Arc<dyn RasterEngine>,
                &RasterSpec::solid(1, 1, color),
            )
            .expect("create image");
            collection.push(image);
        }
        (engine, collection)
    }

    fn raster_ids(collection: &ImageCollection) -> Vec<RasterId> {
        collection
            .iter()
            .map(|image| image.raster_id().expect("live image"))
            .collect()
    }

    #[test]
    fn attach_threads_every_adjacent_pair() -> Result<(), ImageError> {
        let (engine, collection) = engine_and_collection(4);
        let ids = raster_ids(&collection);

        let chain = LinkedChain::attach(engine.as_ref(), collection.images.as_slice())?;
        for pair in ids.windows(2) {
            assert_eq!(engine.next_of(pair[0])?, Some(pair[1]));
        }
        assert_eq!(engine.next_of(ids[3])?, None);
        drop(chain);
        Ok(())
    }

    #[test]
    fn detach_clears_every_link() -> Result<(), ImageError> {
        let (engine, collection) = engine_and_collection(4);
        let ids = raster_ids(&collection);

        let chain = LinkedChain::attach(engine.as_ref(), collection.images.as_slice())?;
        drop(chain);

        // Including the head: no raster may keep a stale next-link.
        for id in ids {
            assert_eq!(engine.next_of(id)?, None);
        }
        Ok(())
    }

    #[test]
    fn links_are_cleared_even_when_the_chain_call_fails() -> Result<(), ImageError> {
        let (engine, mut collection) = engine_and_collection(3);
        let ids = raster_ids(&collection);
        engine.fail_next("coalesce", "corrupt frame list");

        let result = collection.coalesce();
        assert!(matches!(
            result,
            Err(ImageError::Engine(EngineError::Native { .. }))
        ));

        for id in &ids {
            assert_eq!(engine.next_of(*id)?, None);
        }
        // Prior, already-committed state is intact.
        assert_eq!(collection.len(), 3);
        assert_eq!(raster_ids(&collection), ids);
        Ok(())
    }

    #[test]
    fn empty_collection_refuses_batch_operations() {
        let (_engine, mut collection) = engine_and_collection(0);

        for result in [
            collection.append_horizontally().map(|_| ()),
            collection.merge().map(|_| ()),
            collection.flatten().map(|_| ()),
            collection.combine().map(|_| ()),
        ] {
            assert!(matches!(
                result,
                Err(ImageError::InsufficientInput {
                    required: 1,
                    actual: 0
                })
            ));
        }
    }

    #[test]
    fn morph_requires_two_images() {
        let (_engine, mut collection) = engine_and_collection(1);
        assert!(matches!(
            collection.morph(2),
            Err(ImageError::InsufficientInput {
                required: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn morph_inserts_frames_between_pairs() -> Result<(), ImageError> {
        let (_engine, mut collection) = engine_and_collection(2);
        collection.morph(3)?;
        // 2 originals + 3 in-betweens for the single pair.
        assert_eq!(collection.len(), 5);
        Ok(())
    }

    #[test]
    fn coalesce_replaces_contents_and_releases_the_originals() -> Result<(), ImageError> {
        let (engine, mut collection) = engine_and_collection(3);
        let originals = raster_ids(&collection);

        collection.coalesce()?;

        assert_eq!(collection.len(), 3);
        let replaced = raster_ids(&collection);
        for id in &originals {
            assert!(!replaced.contains(id));
            assert!(engine.released().contains(id));
        }
        // No leak: only the replacement frames are alive.
        assert_eq!(engine.live_count(), 3);
        Ok(())
    }

    #[test]
    fn append_produces_one_image_and_keeps_the_collection() -> Result<(), ImageError> {
        let (engine, mut collection) = engine_and_collection(3);

        let appended = collection.append_horizontally()?;
        assert_eq!(collection.len(), 3);
        assert_eq!(appended.width()?, 3);
        assert_eq!(appended.height()?, 1);
        assert_eq!(engine.live_count(), 4);
        Ok(())
    }

    #[test]
    fn quantize_runs_in_place() -> Result<(), ImageError> {
        let (engine, mut collection) = engine_and_collection(2);
        let before = raster_ids(&collection);

        collection.quantize(&QuantizeOptions::default())?;

        assert_eq!(raster_ids(&collection), before);
        assert_eq!(engine.live_count(), 2);
        Ok(())
    }

    #[test]
    fn invalid_quantize_options_never_reach_the_engine() {
        let (engine, mut collection) = engine_and_collection(1);
        let bad = QuantizeOptions {
            colors: 0,
            ..QuantizeOptions::default()
        };
        assert!(matches!(
            collection.quantize(&bad),
            Err(ImageError::InvalidConfiguration(_))
        ));
        assert_eq!(engine.live_count(), 1);
    }

    #[test]
    fn copy_to_clones_into_at_most_the_target_length() -> Result<(), ImageError> {
        let (_engine, collection) = engine_and_collection(3);

        let mut short: [Option<Image>; 2] = [None, None];
        assert_eq!(collection.copy_to(&mut short)?, 2);
        assert!(short.iter().all(Option::is_some));

        let mut long: Vec<Option<Image>> = (0..5).map(|_| None).collect();
        assert_eq!(collection.copy_to(&mut long)?, 3);
        assert!(long[3].is_none() && long[4].is_none());

        // Copies are clones: mutating one never touches the source.
        let mut copy = short[0].take().expect("cloned image");
        copy.resize(9, 9)?;
        assert_eq!(collection[0].width()?, 1);
        Ok(())
    }

    #[test]
    fn add_range_clones_and_leaves_the_source_intact() -> Result<(), ImageError> {
        let (engine, source) = engine_and_collection(2);
        let mut destination = ImageCollection::new(Arc::clone(&engine) as Arc<dyn RasterEngine>);

        destination.add_range(&source)?;

        assert_eq!(destination.len(), 2);
        assert_eq!(source.len(), 2);
        let source_ids = raster_ids(&source);
        for id in raster_ids(&destination) {
            assert!(!source_ids.contains(&id));
        }
        assert_eq!(engine.live_count(), 4);
        Ok(())
    }

    #[test]
    fn warning_from_a_chain_call_is_observed_exactly_once() -> Result<(), ImageError> {
        let (engine, mut collection) = engine_and_collection(2);
        engine.warn_on("flatten", "alpha channel discarded");

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        collection.on_warning(move |warning| sink.lock().unwrap().push(warning.message.clone()));

        let flattened = collection.flatten()?;
        assert_eq!(*seen.lock().unwrap(), vec!["alpha channel discarded"]);
        assert_eq!(flattened.width()?, 1);
        Ok(())
    }

    #[test]
    fn cancellation_aborts_the_call_and_still_unthreads() -> Result<(), ImageError> {
        let (engine, mut collection) = engine_and_collection(3);
        let ids = raster_ids(&collection);
        engine.set_progress_ticks(4);
        collection.on_progress(|progress| progress.completed < 2);

        let result = collection.optimize();
        assert!(matches!(
            result,
            Err(ImageError::Engine(EngineError::Cancelled))
        ));
        for id in ids {
            assert_eq!(engine.next_of(id)?, None);
        }
        assert_eq!(collection.len(), 3);
        Ok(())
    }

    #[test]
    fn read_populates_every_frame_and_write_round_trips() -> Result<(), ImageError> {
        let engine = TestEngine::shared();
        let frames: Vec<_> = (1u8..=3)
            .map(|n| FrameSpec::solid(u32::from(n), 1, [n, 0, 0, 255]))
            .collect();
        let bytes = payload::encode(Format::Gif, &frames);

        let mut collection =
            ImageCollection::from_source(Arc::clone(&engine) as Arc<dyn RasterEngine>, bytes)?;
        assert_eq!(collection.len(), 3);
        assert_eq!(collection[2].width()?, 3);

        let written = collection.write()?;
        let (format, decoded) = payload::decode(&written).map_err(ImageError::Engine)?;
        assert_eq!(format, Format::Gif);
        assert_eq!(decoded.len(), 3);

        // Write threaded the chain; afterwards every link is cleared again.
        for image in &collection {
            assert_eq!(engine.next_of(image.raster_id()?)?, None);
        }
        Ok(())
    }

    #[test]
    fn failed_read_leaves_existing_contents_intact() -> Result<(), ImageError> {
        let (_engine, mut collection) = engine_and_collection(2);
        let before = raster_ids(&collection);

        let result = collection.read(vec![0u8, 1, 2, 3]);
        assert!(matches!(
            result,
            Err(ImageError::Engine(EngineError::Native { .. }))
        ));
        assert_eq!(raster_ids(&collection), before);
        Ok(())
    }

    #[test]
    fn remove_moves_an_image_without_cloning() -> Result<(), ImageError> {
        let (engine, mut first) = engine_and_collection(2);
        let mut second = ImageCollection::new(Arc::clone(&engine) as Arc<dyn RasterEngine>);
        let moved_id = first[1].raster_id()?;

        let image = first.remove(1)?;
        second.push(image);

        assert_eq!(first.len(), 1);
        assert_eq!(second[0].raster_id()?, moved_id);
        assert_eq!(engine.live_count(), 2);
        Ok(())
    }

    #[test]
    fn clear_releases_every_native_resource() {
        let (engine, mut collection) = engine_and_collection(3);
        assert_eq!(engine.live_count(), 3);

        collection.clear();
        assert!(collection.is_empty());
        assert_eq!(engine.live_count(), 0);
        assert_eq!(engine.released().len(), 3);
    }
}
