//! Object handles
//!
//! A handle is an opaque, non-zero integer naming one object kept alive by a
//! [`HandleTable`]. Zero is reserved: it stands for a null object, is never
//! allocated and always resolves to `None`.
//!
//! [`ObjectHandle`] is deliberately neither `Copy` nor `Clone`. Releasing
//! consumes it, so a second release of the same value does not type-check;
//! a handle that must outlive a release is duplicated with
//! [`HandleTable::copy`], which allocates a new slot for the same object.

use parking_lot::Mutex;
use std::fmt;

#[derive(PartialEq, Eq, Hash)]
pub struct ObjectHandle(usize);

impl ObjectHandle {
    /// The reserved handle for a null object
    pub const fn null() -> Self {
        ObjectHandle(0)
    }

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Rebuild a handle received across the boundary
    pub fn from_raw(raw: usize) -> Self {
        ObjectHandle(raw)
    }

    /// Hand ownership of the handle across the boundary
    pub fn into_raw(self) -> usize {
        self.0
    }

    /// The raw value, without giving up ownership
    pub fn as_raw(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHandle({:#x})", self.0)
    }
}

#[derive(Debug)]
struct Slots<T> {
    entries: Vec<Option<T>>,
    free: Vec<usize>,
    live: usize,
}

/// Objects reachable through handles, shared between threads
#[derive(Debug)]
pub struct HandleTable<T> {
    slots: Mutex<Slots<T>>,
}

impl<T: Clone> HandleTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Slots {
                entries: Vec::new(),
                free: Vec::new(),
                live: 0,
            }),
        }
    }

    /// Keep `object` alive and return a handle to it; `None` yields the null handle
    pub fn allocate(&self, object: Option<T>) -> ObjectHandle {
        let Some(object) = object else {
            return ObjectHandle::null();
        };
        let mut slots = self.slots.lock();
        slots.live += 1;
        let index = match slots.free.pop() {
            Some(index) => {
                slots.entries[index] = Some(object);
                index
            }
            None => {
                slots.entries.push(Some(object));
                slots.entries.len() - 1
            }
        };
        ObjectHandle(index + 1)
    }

    /// The object behind `handle`; the null handle resolves to `None`
    pub fn resolve(&self, handle: &ObjectHandle) -> Option<T> {
        if handle.is_null() {
            return None;
        }
        let slots = self.slots.lock();
        slots.entries.get(handle.0 - 1).and_then(|entry| entry.clone())
    }

    /// A second, independently owned handle to the same object
    pub fn copy(&self, handle: &ObjectHandle) -> ObjectHandle {
        self.allocate(self.resolve(handle))
    }

    /// Resolve and release in one step
    pub fn take(&self, handle: ObjectHandle) -> Option<T> {
        let object = self.resolve(&handle);
        self.release(handle);
        object
    }

    /// Stop keeping the object alive; releasing the null handle does nothing
    pub fn release(&self, handle: ObjectHandle) {
        if handle.is_null() {
            return;
        }
        let index = handle.0 - 1;
        let mut slots = self.slots.lock();
        let released = slots
            .entries
            .get_mut(index)
            .map_or(false, |entry| entry.take().is_some());
        if released {
            slots.free.push(index);
            slots.live -= 1;
        } else {
            log::warn!("Released unknown object handle {:?}", handle);
        }
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.slots.lock().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone> Default for HandleTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_round_trip_returns_the_same_object() {
        let table = HandleTable::new();
        let object = Arc::new(String::from("player"));
        let handle = table.allocate(Some(object.clone()));
        assert!(!handle.is_null());
        let resolved = table.resolve(&handle).unwrap();
        assert!(Arc::ptr_eq(&resolved, &object));
        table.release(handle);
        assert!(table.is_empty());
    }

    #[test]
    fn test_null_object_gets_reserved_handle() {
        let table: HandleTable<Arc<String>> = HandleTable::new();
        let handle = table.allocate(None);
        assert!(handle.is_null());
        assert_eq!(handle.as_raw(), 0);
        assert!(table.resolve(&handle).is_none());
        assert!(table.resolve(&ObjectHandle::null()).is_none());
        table.release(handle);
        assert!(table.is_empty());
    }

    #[test]
    fn test_copy_outlives_original() {
        let table = HandleTable::new();
        let original = table.allocate(Some(7));
        let copy = table.copy(&original);
        assert_ne!(original.as_raw(), copy.as_raw());
        table.release(original);
        assert_eq!(table.resolve(&copy), Some(7));
        assert_eq!(table.take(copy), Some(7));
        assert!(table.is_empty());
    }

    #[test]
    fn test_released_slots_are_reused() {
        let table = HandleTable::new();
        let first = table.allocate(Some(1));
        let raw = first.as_raw();
        table.release(first);
        let second = table.allocate(Some(2));
        assert_eq!(second.as_raw(), raw);
        assert_eq!(table.resolve(&second), Some(2));
    }

    #[test]
    fn test_raw_values_cross_and_come_back() {
        let table = HandleTable::new();
        let raw = table.allocate(Some("enemy")).into_raw();
        let handle = ObjectHandle::from_raw(raw);
        assert_eq!(table.resolve(&handle), Some("enemy"));
    }

    #[test]
    fn test_concurrent_allocation() {
        let table = Arc::new(HandleTable::new());
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    for i in 0..100 {
                        let handle = table.allocate(Some(worker * 1000 + i));
                        assert_eq!(table.resolve(&handle), Some(worker * 1000 + i));
                        if i % 2 == 0 {
                            table.release(handle);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(table.len(), 8 * 50);
    }
}
