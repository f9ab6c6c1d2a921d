/// Group identifier type.
///
/// - `GroupId`: fixed-length opaque identifier addressing one group conversation

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::group::limits::GROUP_ID_LENGTH;

// ---------------------------------------------------------------------------
// GroupId
// ---------------------------------------------------------------------------

/// Opaque group identifier of exactly `GROUP_ID_LENGTH` bytes.
///
/// Once assigned to a `GroupModel` it only changes through
/// `GroupModel::update_group_id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub [u8; GROUP_ID_LENGTH]);

impl GroupId {
    /// Generate a fresh random identifier.
    pub fn random() -> Self {
        GroupId(rand::random::<[u8; GROUP_ID_LENGTH]>())
    }

    /// Create from raw bytes.
    pub fn from_bytes(bytes: [u8; GROUP_ID_LENGTH]) -> Self {
        GroupId(bytes)
    }

    /// Create from a slice, which must be exactly `GROUP_ID_LENGTH` bytes.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let id: [u8; GROUP_ID_LENGTH] = bytes.try_into().ok()?;
        Some(GroupId(id))
    }

    /// Return the raw bytes.
    pub fn as_bytes(&self) -> &[u8; GROUP_ID_LENGTH] {
        &self.0
    }

    /// Hex-encode for display/storage.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Decode from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        GroupId::from_slice(&bytes).ok_or(hex::FromHexError::InvalidStringLength)
    }
}

impl Ord for GroupId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for GroupId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({}..)", &self.to_hex()[..12])
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
