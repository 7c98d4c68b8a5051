//! The startup function-pointer table
//!
//! Slot `i` holds the function whose global name sorts `i`-th among all table
//! entries. Both halves derive that order independently from the same
//! names, so the table itself carries nothing but addresses.

use crate::error::{InitError, InitResult};
use std::ffi::c_void;

/// Ordered names of every table entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableLayout {
    names: Vec<String>,
}

impl TableLayout {
    /// Sorts the names; duplicates collapse to one slot
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = names.into_iter().map(Into::into).collect();
        names.sort();
        names.dedup();
        Self { names }
    }

    /// N, the number of entries both halves must agree on
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn slot_of(&self, name: &str) -> Option<usize> {
        self.names.binary_search_by(|entry| entry.as_str().cmp(name)).ok()
    }
}

/// Addresses received at startup, one per layout slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionTable {
    pointers: Vec<usize>,
}

impl FunctionTable {
    /// Accept a transmitted table, checking it against `layout`
    pub fn receive(layout: &TableLayout, pointers: &[usize]) -> InitResult<Self> {
        if pointers.len() != layout.len() {
            return Err(InitError::CountMismatch {
                expected: layout.len(),
                received: pointers.len() as i64,
            });
        }
        if let Some(slot) = pointers.iter().position(|pointer| *pointer == 0) {
            return Err(InitError::NullEntry {
                slot,
                name: layout.names[slot].clone(),
            });
        }
        Ok(Self {
            pointers: pointers.to_vec(),
        })
    }

    /// Accept a table in the shape the managed side transmits it
    ///
    /// # Safety
    /// When `count` equals the layout length, `pointers` must be valid for
    /// reads of `count` consecutive pointers.
    pub unsafe fn receive_raw(layout: &TableLayout, pointers: *const *const c_void, count: i32) -> InitResult<Self> {
        if i64::from(count) != layout.len() as i64 {
            return Err(InitError::CountMismatch {
                expected: layout.len(),
                received: i64::from(count),
            });
        }
        if layout.is_empty() {
            return Ok(Self { pointers: Vec::new() });
        }
        if pointers.is_null() {
            return Err(InitError::NullTable { count: layout.len() });
        }
        let slice = std::slice::from_raw_parts(pointers, layout.len());
        let addresses: Vec<usize> = slice.iter().map(|pointer| *pointer as usize).collect();
        Self::receive(layout, &addresses)
    }

    pub fn get(&self, slot: usize) -> Option<usize> {
        self.pointers.get(slot).copied()
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}
