//! Initialization and reload
//!
//! ```text
//! Uninitialized -> Transmitting -> Ready -> Reloading -> Transmitting -> Ready
//! ```
//!
//! A failed transmission returns to the state it started from. Boundary
//! functions are only handed out while `Ready`.

use crate::destroy_queue::{DestroyQueue, PendingRelease};
use crate::error::{InitError, InitResult};
use crate::table::{FunctionTable, TableLayout};
use parking_lot::{Mutex, RwLock};
use std::ffi::c_void;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitState {
    Uninitialized,
    Transmitting,
    Ready,
    Reloading,
}

/// One side's view of the boundary
#[derive(Debug)]
pub struct Runtime {
    layout: TableLayout,
    state: Mutex<InitState>,
    table: RwLock<Option<FunctionTable>>,
    destroy_queue: DestroyQueue,
}

impl Runtime {
    pub fn new(layout: TableLayout) -> Self {
        Self {
            layout,
            state: Mutex::new(InitState::Uninitialized),
            table: RwLock::new(None),
            destroy_queue: DestroyQueue::new(),
        }
    }

    pub fn state(&self) -> InitState {
        *self.state.lock()
    }

    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    pub fn destroy_queue(&self) -> &DestroyQueue {
        &self.destroy_queue
    }

    /// Receive the function-pointer table
    pub fn initialize(&self, pointers: &[usize]) -> InitResult<()> {
        self.transmit(|layout| FunctionTable::receive(layout, pointers))
    }

    /// Receive the function-pointer table as the exported entry point gets it
    ///
    /// # Safety
    /// See [`FunctionTable::receive_raw`].
    pub unsafe fn initialize_raw(&self, pointers: *const *const c_void, count: i32) -> InitResult<()> {
        self.transmit(|layout| FunctionTable::receive_raw(layout, pointers, count))
    }

    /// Like [`initialize`](Self::initialize), but a mismatched table ends the process
    pub fn initialize_or_abort(&self, pointers: &[usize]) {
        if let Err(err) = self.initialize(pointers) {
            log::error!("Reinterop initialization failed: {}", err);
            eprintln!("Reinterop: {}", err);
            std::process::abort();
        }
    }

    fn transmit<F>(&self, receive: F) -> InitResult<()>
    where
        F: FnOnce(&TableLayout) -> InitResult<FunctionTable>,
    {
        let mut state = self.state.lock();
        let previous = *state;
        if !matches!(previous, InitState::Uninitialized | InitState::Reloading) {
            return Err(InitError::InvalidTransition {
                from: previous,
                to: InitState::Transmitting,
            });
        }
        *state = InitState::Transmitting;

        match receive(&self.layout) {
            Ok(table) => {
                log::info!("Received {} boundary functions", table.len());
                *self.table.write() = Some(table);
                *state = InitState::Ready;
                Ok(())
            }
            Err(err) => {
                log::error!("Rejected function table: {}", err);
                *state = previous;
                Err(err)
            }
        }
    }

    /// Run the releases queued since the last call; call once per frame
    ///
    /// `dispatch` may look functions up on this runtime. Returns the number
    /// of releases dispatched.
    pub fn update<F>(&self, dispatch: F) -> InitResult<usize>
    where
        F: FnMut(PendingRelease),
    {
        self.require_ready()?;
        Ok(self.destroy_queue.flush(dispatch))
    }

    /// Flush pending releases and drop the table before the native module is swapped
    ///
    /// Returns the number of releases dispatched.
    pub fn prepare_for_reload<F>(&self, dispatch: F) -> InitResult<usize>
    where
        F: FnMut(PendingRelease),
    {
        if let Err(InitError::NotReady(from)) = self.require_ready() {
            return Err(InitError::InvalidTransition {
                from,
                to: InitState::Reloading,
            });
        }
        let flushed = self.destroy_queue.flush(dispatch);

        let mut state = self.state.lock();
        if *state != InitState::Ready {
            return Err(InitError::InvalidTransition {
                from: *state,
                to: InitState::Reloading,
            });
        }
        *self.table.write() = None;
        *state = InitState::Reloading;
        log::info!("Prepared for reload, {} deferred releases flushed", flushed);
        Ok(flushed)
    }

    fn require_ready(&self) -> InitResult<()> {
        match self.state() {
            InitState::Ready => Ok(()),
            state => Err(InitError::NotReady(state)),
        }
    }

    /// Address of the boundary function named `name`
    pub fn function(&self, name: &str) -> InitResult<usize> {
        let slot = self
            .layout
            .slot_of(name)
            .ok_or_else(|| InitError::UnknownFunction(name.to_string()))?;
        self.function_at(slot)
    }

    pub fn function_at(&self, slot: usize) -> InitResult<usize> {
        let state = self.state.lock();
        if *state != InitState::Ready {
            return Err(InitError::NotReady(*state));
        }
        self.table
            .read()
            .as_ref()
            .and_then(|table| table.get(slot))
            .ok_or(InitError::NotReady(*state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> Runtime {
        Runtime::new(TableLayout::new(["Game_Foo_Bar", "Game_Foo_Construct"]))
    }

    #[test]
    fn test_startup_reaches_ready() {
        let runtime = runtime();
        assert_eq!(runtime.state(), InitState::Uninitialized);
        assert_eq!(
            runtime.function("Game_Foo_Bar"),
            Err(InitError::NotReady(InitState::Uninitialized))
        );

        runtime.initialize(&[0x10, 0x20]).unwrap();
        assert_eq!(runtime.state(), InitState::Ready);
        assert_eq!(runtime.function("Game_Foo_Bar"), Ok(0x10));
        assert_eq!(runtime.function("Game_Foo_Construct"), Ok(0x20));
        assert_eq!(
            runtime.function("Game_Foo_Baz"),
            Err(InitError::UnknownFunction("Game_Foo_Baz".to_string()))
        );
    }

    #[test]
    fn test_mismatch_leaves_runtime_uninitialized() {
        let runtime = runtime();
        let err = runtime.initialize(&[0x10]).unwrap_err();
        assert_eq!(err, InitError::CountMismatch { expected: 2, received: 1 });
        assert_eq!(runtime.state(), InitState::Uninitialized);
    }

    #[test]
    fn test_initializing_twice_is_rejected() {
        let runtime = runtime();
        runtime.initialize(&[0x10, 0x20]).unwrap();
        assert_eq!(
            runtime.initialize(&[0x10, 0x20]),
            Err(InitError::InvalidTransition {
                from: InitState::Ready,
                to: InitState::Transmitting
            })
        );
    }

    #[test]
    fn test_reload_flushes_queue_and_retransmits() {
        let runtime = runtime();
        runtime.initialize(&[0x10, 0x20]).unwrap();
        runtime.destroy_queue().enqueue(0, 0xdead);
        runtime.destroy_queue().enqueue(0, 0xbeef);

        let mut released = Vec::new();
        let flushed = runtime
            .prepare_for_reload(|release| released.push(release.pointer))
            .unwrap();
        assert_eq!(flushed, 2);
        assert_eq!(released, vec![0xdead, 0xbeef]);
        assert_eq!(runtime.state(), InitState::Reloading);
        assert_eq!(runtime.function("Game_Foo_Bar"), Err(InitError::NotReady(InitState::Reloading)));

        runtime.initialize(&[0x30, 0x40]).unwrap();
        assert_eq!(runtime.state(), InitState::Ready);
        assert_eq!(runtime.function("Game_Foo_Bar"), Ok(0x30));
    }

    #[test]
    fn test_update_dispatches_pending_releases_each_frame() {
        let runtime = runtime();
        runtime.destroy_queue().enqueue(0, 0xdead);
        assert_eq!(runtime.update(|_| {}), Err(InitError::NotReady(InitState::Uninitialized)));
        assert_eq!(runtime.destroy_queue().len(), 1);

        runtime.initialize(&[0x10, 0x20]).unwrap();
        let mut released = Vec::new();
        let flushed = runtime
            .update(|release| {
                let destroy = runtime.function("Game_Foo_Bar").unwrap();
                released.push((destroy, release.pointer));
            })
            .unwrap();
        assert_eq!(flushed, 1);
        assert_eq!(released, vec![(0x10, 0xdead)]);
        assert_eq!(runtime.update(|_| {}), Ok(0));
        assert_eq!(runtime.state(), InitState::Ready);
    }

    #[test]
    fn test_reload_dispatch_can_still_call_native_functions() {
        let runtime = runtime();
        runtime.initialize(&[0x10, 0x20]).unwrap();
        runtime.destroy_queue().enqueue(0, 0xdead);

        let mut seen = Vec::new();
        runtime
            .prepare_for_reload(|_| seen.push(runtime.function("Game_Foo_Construct")))
            .unwrap();
        assert_eq!(seen, vec![Ok(0x20)]);
        assert_eq!(runtime.state(), InitState::Reloading);
    }

    #[test]
    fn test_reload_requires_ready() {
        let runtime = runtime();
        assert!(matches!(
            runtime.prepare_for_reload(|_| {}),
            Err(InitError::InvalidTransition { from: InitState::Uninitialized, .. })
        ));
    }
}
