use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

use crate::engine::RasterEngine;
use crate::error::EngineError;

/// Opaque identifier for a resource owned by the native engine.
///
/// Ids are handed out by the engine and never fabricated by the binding
/// layer. Zero is reserved as the engine's null handle and cannot be
/// represented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RasterId(NonZeroU64);

impl RasterId {
    /// Wraps a raw engine identifier, rejecting the reserved zero value.
    pub fn from_raw(raw: u64) -> Option<Self> {
        NonZeroU64::new(raw).map(Self)
    }

    /// The raw engine identifier.
    pub fn as_raw(&self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for RasterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HandleState {
    Unattached,
    Owned(RasterId),
    Released,
}

/// Exclusive owner of one engine resource.
///
/// The handle moves through `Unattached -> Owned -> Released` (with
/// `Owned -> Owned` via [`replace`](Self::replace)). `Released` is terminal:
/// every later access fails with [`EngineError::Disposed`] instead of
/// silently doing nothing, and the resource is released at most once no
/// matter how often release is requested.
///
/// Dropping an owned handle releases the resource deterministically.
/// Failures on the drop path are logged and swallowed; there is no caller
/// left to observe them.
pub struct RasterHandle {
    engine: Arc<dyn RasterEngine>,
    state: HandleState,
}

impl RasterHandle {
    /// Creates a handle that does not yet own a resource.
    pub fn unattached(engine: Arc<dyn RasterEngine>) -> Self {
        Self {
            engine,
            state: HandleState::Unattached,
        }
    }

    /// Takes exclusive ownership of an id the engine just handed out.
    pub fn adopt(engine: Arc<dyn RasterEngine>, id: RasterId) -> Self {
        Self {
            engine,
            state: HandleState::Owned(id),
        }
    }

    /// Runs `factory` against the engine and adopts the resource it creates.
    ///
    /// # Errors
    ///
    /// Propagates the factory's engine error; nothing is owned afterwards.
    pub fn acquire<F>(engine: Arc<dyn RasterEngine>, factory: F) -> Result<Self, EngineError>
    where
        F: FnOnce(&dyn RasterEngine) -> Result<RasterId, EngineError>,
    {
        let id = factory(engine.as_ref())?;
        Ok(Self::adopt(engine, id))
    }

    /// The engine this handle releases into.
    pub fn engine(&self) -> &Arc<dyn RasterEngine> {
        &self.engine
    }

    /// Whether the handle currently owns a resource.
    pub fn is_owned(&self) -> bool {
        matches!(self.state, HandleState::Owned(_))
    }

    /// Whether the handle reached its terminal state.
    pub fn is_released(&self) -> bool {
        self.state == HandleState::Released
    }

    /// The owned id.
    ///
    /// # Errors
    ///
    /// [`EngineError::Disposed`] when nothing is owned, either because the
    /// handle was never attached or because it was already released.
    pub fn id(&self) -> Result<RasterId, EngineError> {
        match self.state {
            HandleState::Owned(id) => Ok(id),
            HandleState::Unattached | HandleState::Released => Err(EngineError::Disposed),
        }
    }

    /// Attaches the first resource to an unattached handle.
    ///
    /// # Errors
    ///
    /// [`EngineError::Disposed`] on a released handle;
    /// [`EngineError::Contract`] on an owned one, where
    /// [`replace`](Self::replace) is the correct call.
    pub fn attach(&mut self, id: RasterId) -> Result<(), EngineError> {
        match self.state {
            HandleState::Unattached => {
                self.state = HandleState::Owned(id);
                Ok(())
            }
            HandleState::Owned(_) => Err(EngineError::Contract(
                "attach on an owned handle; use replace".into(),
            )),
            HandleState::Released => Err(EngineError::Disposed),
        }
    }

    /// Releases the owned resource and moves to the terminal state.
    ///
    /// Idempotent: the second and later calls are no-ops, as is releasing a
    /// handle that was never attached.
    ///
    /// # Errors
    ///
    /// Propagates the engine's release failure. The handle still ends in the
    /// terminal state, so the release is never retried.
    pub fn release(&mut self) -> Result<(), EngineError> {
        match std::mem::replace(&mut self.state, HandleState::Released) {
            HandleState::Owned(id) => self.engine.release(id),
            HandleState::Unattached | HandleState::Released => Ok(()),
        }
    }

    /// Swaps the owned resource for `id`, releasing the previous one.
    ///
    /// This is how an in-place transform adopts the replacement resource the
    /// engine returns: external references to the wrapper stay valid across
    /// the swap. The new resource is adopted even if releasing the previous
    /// one fails, so a release failure can never leak the replacement.
    ///
    /// # Errors
    ///
    /// [`EngineError::Disposed`] when the handle owns nothing, or the
    /// engine's failure to release the previous resource.
    pub fn replace(&mut self, id: RasterId) -> Result<(), EngineError> {
        match self.state {
            HandleState::Owned(old) => {
                self.state = HandleState::Owned(id);
                self.engine.release(old)
            }
            HandleState::Unattached | HandleState::Released => Err(EngineError::Disposed),
        }
    }
}

impl fmt::Debug for RasterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RasterHandle")
            .field("state", &self.state)
            .finish()
    }
}

impl Drop for RasterHandle {
    fn drop(&mut self) {
        if let HandleState::Owned(id) = std::mem::replace(&mut self.state, HandleState::Released) {
            if let Err(err) = self.engine.release(id) {
                log::warn!("failed to release raster {id} on drop: {err}");
            }
        }
    }
}
