#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! This top-level crate re-exports the effigy workspace: the engine-boundary
//! contract (`effigy-engine`) and the managed image layer (`effigy-image`).
//!
//! ```
//! use std::sync::Arc;
//!
//! use effigy::engine::{RasterEngine, RasterSpec};
//! use effigy::image::{Image, ImageCollection};
//! use effigy_test::TestEngine;
//!
//! let engine = TestEngine::shared();
//!
//! let mut animation = ImageCollection::new(Arc::clone(&engine) as Arc<dyn RasterEngine>);
//! for shade in [64u8, 128, 192] {
//!     let frame = Image::new(
//!         Arc::clone(&engine) as Arc<dyn RasterEngine>,
//!         &RasterSpec::solid(2, 2, [shade, shade, shade, 255]),
//!     )
//!     .unwrap();
//!     animation.push(frame);
//! }
//!
//! animation.coalesce().unwrap();
//! assert_eq!(animation.len(), 3);
//! ```

#[doc(inline)]
pub use effigy_engine as engine;

#[doc(inline)]
pub use effigy_image as image;
