//! Deferred release of host resources read by asynchronous device work
//!
//! An asynchronous host-to-device copy reads its source buffer some time after
//! the enqueue call returns. The buffer must stay alive until the device says
//! the copy is done. [`DeferredRelease`] holds such a buffer behind an `Arc`
//! and gives its last reference to a completion callback, so the buffer is
//! freed by whoever runs that callback (a driver thread for CUDA streams).

use crate::error::Result;
use std::ops::Deref;
use std::sync::Arc;

/// Boxed completion callback handed to a stream
pub type ReleaseCallback = Box<dyn FnOnce() + Send + 'static>;

/// Reference-counted resource whose release is deferred to a completion callback
///
/// # Example
///
/// ```
/// use splitr::runtime::DeferredRelease;
///
/// let staging = DeferredRelease::new(vec![0u64; 4]);
/// let observer = staging.clone();
///
/// let mut pending = Vec::new();
/// staging
///     .release_with(|callback| {
///         pending.push(callback);
///         Ok(())
///     })
///     .unwrap();
///
/// // Still alive: the callback holds a reference.
/// assert_eq!(observer.ref_count(), 2);
/// for callback in pending.drain(..) {
///     callback();
/// }
/// assert_eq!(observer.ref_count(), 1);
/// ```
pub struct DeferredRelease<T: Send + Sync + 'static> {
    inner: Arc<T>,
}

impl<T: Send + Sync + 'static> DeferredRelease<T> {
    /// Wrap a resource
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Number of live references, including any held by pending callbacks
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Move this reference into a completion callback
    ///
    /// `register` receives a callback that drops the reference when invoked
    /// and must arrange for it to run once the work reading the resource has
    /// completed. If `register` fails it is responsible for keeping the
    /// resource alive until that work has drained.
    pub fn release_with<F>(self, register: F) -> Result<()>
    where
        F: FnOnce(ReleaseCallback) -> Result<()>,
    {
        let held = self.inner;
        register(Box::new(move || drop(held)))
    }
}

impl<T: Send + Sync + 'static> Clone for DeferredRelease<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> Deref for DeferredRelease<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T: Send + Sync + std::fmt::Debug + 'static> std::fmt::Debug for DeferredRelease<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredRelease")
            .field("value", &*self.inner)
            .field("refs", &self.ref_count())
            .finish()
    }
}
