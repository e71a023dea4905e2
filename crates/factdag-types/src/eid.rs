use std::fmt;

use serde::{Deserialize, Serialize};

/// Database-scoped entity identifier.
///
/// The upper 32 bits carry the id of the database instance that minted the
/// identifier; the lower 32 bits carry that instance's local sequence. Two
/// instances can therefore allocate identifiers without coordination.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Eid(u64);

impl Eid {
    /// Compose an identifier from an instance id and a local sequence number.
    pub const fn new(iid: u32, local: u32) -> Self {
        Self(((iid as u64) << 32) | local as u64)
    }

    /// Reinterpret a raw 64-bit value.
    pub const fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw 64-bit value.
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// The instance that minted this identifier.
    pub const fn iid(&self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The instance-local sequence number.
    pub const fn local(&self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Debug for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Eid({}:{})", self.iid(), self.local())
    }
}

impl fmt::Display for Eid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.iid(), self.local())
    }
}

/// Lazy supply of fresh entity identifiers for one instance.
///
/// Yields `Eid::new(iid, next)`, `Eid::new(iid, next + 1)`, ... and stops
/// only when the local sequence space is exhausted.
#[derive(Clone, Debug)]
pub struct Eids {
    iid: u32,
    next: Option<u32>,
}

impl Eids {
    /// Start allocating at `next_local` within instance `iid`.
    pub fn new(iid: u32, next_local: u32) -> Self {
        Self {
            iid,
            next: Some(next_local),
        }
    }

    /// The instance this supply allocates for.
    pub fn iid(&self) -> u32 {
        self.iid
    }

    /// The local sequence number the next call to `next()` will use.
    pub fn peek_local(&self) -> Option<u32> {
        self.next
    }
}

impl Iterator for Eids {
    type Item = Eid;

    fn next(&mut self) -> Option<Eid> {
        let local = self.next?;
        self.next = local.checked_add(1);
        Some(Eid::new(self.iid, local))
    }
}
