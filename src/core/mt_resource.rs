use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

/// A thread-safe, reference-counted resource container with read-write locking.
///
/// `MtResource` provides synchronized access to a value of type `T` that can be shared
/// between the coordinator and the worker pool. It uses an `Arc<RwLock<T>>` internally.
/// Cloning an `MtResource` clones the handle, not the value.
///
/// # Examples
///
/// ```
/// # use std::thread;
/// use voxel_streamer::core::MtResource;
///
/// let table = MtResource::new(Vec::<u32>::new());
/// let worker_view = table.clone();
///
/// let handle = thread::spawn(move || {
///     worker_view.get_mut().push(7);
/// });
///
/// handle.join().unwrap();
/// assert_eq!(table.get().as_slice(), &[7]);
/// ```
///
/// # Performance Considerations
/// - Read operations (`get()`) can occur concurrently
/// - Write operations (`get_mut()`) are exclusive and will block other operations
/// - `try_get_mut()` never blocks and is meant for opportunistic maintenance work
pub struct MtResource<T: Send + Sync> {
    resource: Arc<RwLock<T>>,
}

impl<T: Send + Sync> MtResource<T> {
    /// Creates a new `MtResource` containing the given value.
    pub fn new(resource: T) -> Self {
        Self {
            resource: Arc::new(RwLock::new(resource)),
        }
    }

    /// Returns a read-only guard that allows reading the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned, which only happens after another thread
    /// panicked while holding it.
    pub fn get(&self) -> RwLockReadGuard<'_, T> {
        self.resource.read().unwrap()
    }

    /// Returns a mutable guard that allows modifying the contained value.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn get_mut(&self) -> RwLockWriteGuard<'_, T> {
        self.resource.write().unwrap()
    }

    /// Attempts to acquire the write lock without blocking.
    ///
    /// # Returns
    /// `None` when any other reader or writer currently holds the lock.
    ///
    /// # Panics
    /// Panics if the lock is poisoned.
    pub fn try_get_mut(&self) -> Option<RwLockWriteGuard<'_, T>> {
        match self.resource.try_write() {
            Ok(guard) => Some(guard),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(error)) => panic!("resource lock poisoned: {error}"),
        }
    }
}

impl<T: Send + Sync> Clone for MtResource<T> {
    fn clone(&self) -> Self {
        Self {
            resource: self.resource.clone(),
        }
    }
}

impl<T: Send + Sync + Default> Default for MtResource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_value() {
        let resource = MtResource::new(1);
        let other = resource.clone();
        *other.get_mut() = 5;
        assert_eq!(*resource.get(), 5);
    }

    #[test]
    fn try_get_mut_fails_while_read_locked() {
        let resource = MtResource::new(0u8);
        let reader = resource.get();
        assert!(resource.try_get_mut().is_none());
        drop(reader);
        assert!(resource.try_get_mut().is_some());
    }
}
