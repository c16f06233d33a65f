//! Wire identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a qubit or continuous-variable mode.
///
/// Wires are not owned by the circuit; they only act as the join key that
/// decides which operations depend on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wire(pub u32);

impl Wire {
    /// The wire number as a `usize`, for indexing.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Wire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Wire {
    fn from(id: u32) -> Self {
        Wire(id)
    }
}

/// Collect anything wire-like into a `Vec<Wire>`.
pub fn wires<I, W>(iter: I) -> Vec<Wire>
where
    I: IntoIterator<Item = W>,
    W: Into<Wire>,
{
    iter.into_iter().map(Into::into).collect()
}
