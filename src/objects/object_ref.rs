//! The reference table of a decode session.

use ahash::AHashMap;

use crate::types::Handle;

/// References are reserved this many at a time.
pub const REFS_PER_REALLOC: usize = 100;

/// One reference read from a handle stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ObjectRef {
    /// Code and value as stored.
    pub handleref: Handle,
    /// Target handle after applying the code to the owner's handle.
    pub absolute_ref: u64,
    /// Index of the target in the object table, once resolved.
    pub obj: Option<usize>,
}

/// Growable table of every reference read while decoding one drawing.
///
/// Entries are never removed; indices stay valid for the session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectRefTable {
    refs: Vec<ObjectRef>,
}

impl ObjectRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handleref`, read for a record owned by `owner`, and return
    /// its index.
    pub fn push(&mut self, handleref: Handle, owner: Option<&Handle>) -> usize {
        if self.refs.len() == self.refs.capacity() {
            self.refs.reserve_exact(REFS_PER_REALLOC);
        }
        let index = self.refs.len();
        self.refs.push(ObjectRef {
            handleref,
            absolute_ref: handleref.resolve(owner),
            obj: None,
        });
        index
    }

    pub fn get(&self, index: usize) -> Option<&ObjectRef> {
        self.refs.get(index)
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.refs.capacity()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectRef> {
        self.refs.iter()
    }

    /// Link every reference to the object whose handle equals its absolute
    /// target. `objects` maps handle values to object indices. Returns the
    /// number of linked references.
    pub fn resolve(&mut self, objects: &AHashMap<u64, usize>) -> usize {
        let mut linked = 0;
        for reference in self.refs.iter_mut() {
            reference.obj = objects.get(&reference.absolute_ref).copied();
            if reference.obj.is_some() {
                linked += 1;
            }
        }
        linked
    }
}
