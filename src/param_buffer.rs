//! The Parameter Buffer (§4.2): the growable, parallel-array structure
//! holding the typed parameters destined for the backend.

use smallvec::SmallVec;

use crate::oid::Oid;
use crate::type_info::PgValueFormat;

/// Most statements bind a handful of parameters; inline storage for the
/// first 8 avoids a heap allocation for the common case.
type Slots = SmallVec<[ParameterSlot; 8]>;

/// Who owns the bytes backing a slot, and so who is responsible for
/// releasing them at teardown (§3 data model).
///
/// The original source tracks this as a discriminant byte next to a raw
/// pointer; here it is a sum type that actually owns what it names, so
/// `Drop` alone would already be memory-safe. `ParameterBuffer::free_all`
/// still performs the release explicitly and is still idempotent, because
/// the invariant being tested (§8.1: "no leaks, no double-free") is about
/// the *protocol* being followed on every exit path, not merely about
/// avoiding undefined behavior.
pub enum Ownership {
    /// Freshly allocated bytes (e.g. a binary-encoded integer); freed when
    /// the slot is dropped.
    Owned(Vec<u8>),
    /// A reference-counted view into the producing value's own buffer
    /// (e.g. a `Bytes` or `String` the caller already owns). Releasing the
    /// slot drops this handle, which only frees the backing allocation
    /// once every other clone of it (including the caller's) is gone.
    Borrowed(Bytes),
    /// `SQL NULL`; nothing to release.
    Null,
}

/// A borrowed byte range. `bytes::Bytes` already does reference-counted
/// sharing; we use it here as the "borrowed-from-value" view so a slot
/// never has to copy a value's bytes just to hold a reference to them.
pub type Bytes = bytes::Bytes;

/// A single bound value destined for the backend (§3 data model).
pub struct ParameterSlot {
    pub type_oid: Oid,
    pub format: PgValueFormat,
    ownership: Ownership,
}

impl ParameterSlot {
    pub fn null() -> Self {
        ParameterSlot {
            type_oid: Oid::UNSPECIFIED,
            format: PgValueFormat::Text,
            ownership: Ownership::Null,
        }
    }

    pub fn owned(type_oid: Oid, format: PgValueFormat, bytes: Vec<u8>) -> Self {
        ParameterSlot {
            type_oid,
            format,
            ownership: Ownership::Owned(bytes),
        }
    }

    pub fn borrowed(type_oid: Oid, format: PgValueFormat, bytes: Bytes) -> Self {
        ParameterSlot {
            type_oid,
            format,
            ownership: Ownership::Borrowed(bytes),
        }
    }

    /// Byte length on the wire; `0` for `NULL` (§3 invariant).
    pub fn length(&self) -> usize {
        self.as_bytes().map_or(0, <[u8]>::len)
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.ownership {
            Ownership::Owned(bytes) => Some(bytes),
            Ownership::Borrowed(bytes) => Some(bytes),
            Ownership::Null => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.ownership, Ownership::Null)
    }
}

/// Ordered sequence of [`ParameterSlot`], indexed 1..N on the wire (§3, §4.2).
#[derive(Default)]
pub struct ParameterBuffer {
    slots: Slots,
}

impl ParameterBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow to at least `n` slots, zero-initializing (as `NULL`) any new
    /// tail. Idempotent for `n` at or below the current length.
    pub fn reserve(&mut self, n: usize) {
        if n > self.slots.len() {
            self.slots.reserve(n - self.slots.len());
            while self.slots.len() < n {
                self.slots.push(ParameterSlot::null());
            }
        }
    }

    pub fn append_slot(&mut self, slot: ParameterSlot) {
        self.slots.push(slot);
    }

    pub fn set_slot(&mut self, index: usize, slot: ParameterSlot) {
        self.slots[index] = slot;
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterSlot> {
        self.slots.iter()
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut ParameterSlot> {
        self.slots.get_mut(index)
    }

    /// Release every slot's hold on its bytes, then empty the buffer.
    /// Idempotent: calling this on an already-empty buffer is a no-op
    /// (§4.2 invariants, §8.1).
    pub fn free_all(&mut self) {
        self.slots.clear();
    }
}
