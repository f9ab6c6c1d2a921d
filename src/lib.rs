//! # Shield Group Model
//!
//! **Identity and membership state of a group conversation, and the text of
//! the notices shown when that state changes.**
//!
//! ```rust
//! use std::collections::HashMap;
//! use shield_group_model::{describe_update, GroupId, GroupModel, GroupType};
//!
//! let id = GroupId::random();
//! let old = GroupModel::new(
//!     Some("Team".to_string()),
//!     vec!["alice".to_string(), "bob".to_string()],
//!     None,
//!     id,
//!     GroupType::Signal,
//! );
//! let mut new = old.clone();
//! new.set_name(Some("Team Alpha".to_string()));
//! new.add_member("carol").unwrap();
//!
//! let mut names = HashMap::new();
//! names.insert("carol".to_string(), "Carol".to_string());
//!
//! assert_eq!(
//!     describe_update(&old, &new, &names),
//!     vec!["title changed to Team Alpha", "Carol added"]
//! );
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`group::ids`] | Fixed-length group identifier |
//! | [`group::model`] | Group snapshot, equality, membership and admin operations |
//! | [`group::describe`] | Ordered, human-readable diff of two snapshots |
//! | [`group::limits`] | Process-wide constants |
//!
//! Persistence, contact directories and image rendering are left to the
//! caller: snapshots derive `serde` traits, names come from a
//! [`DisplayNameResolver`], and avatars are opaque bytes.

#![allow(clippy::empty_line_after_doc_comments, clippy::doc_lazy_continuation)]

// ── Public modules ──────────────────────────────────────────────────────────

/// Group model, identifiers and update descriptions.
pub mod group;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use group::{
    describe_update, render_notice, Avatar, DisplayNameResolver, GroupId, GroupModel,
    GroupModelError, GroupType, GroupUpdate, RawIdResolver, UpdateDescriber, GROUP_ID_LENGTH,
};

// ── Library metadata ────────────────────────────────────────────────────────

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the crate version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
        assert!(version().contains('.'));
    }

    #[test]
    fn test_reexports_describe_rotated_group() {
        let mut model = GroupModel::new(
            Some("Ops".to_string()),
            vec!["a".to_string()],
            None,
            GroupId::from_bytes([1u8; GROUP_ID_LENGTH]),
            GroupType::Signal,
        );
        let before = model.clone();
        model.update_group_id(GroupId::from_bytes([2u8; GROUP_ID_LENGTH]));

        assert_ne!(before, model);
        // Id rotation alone is not a describable change.
        assert!(describe_update(&before, &model, &RawIdResolver).is_empty());
    }

    #[test]
    fn test_stored_snapshot_describes_later_update() -> anyhow::Result<()> {
        let stored = GroupModel::try_new(
            Some("Ops".to_string()),
            vec!["a".to_string(), "b".to_string()],
            vec!["a".to_string()],
            Some(Avatar::new(vec![0x89, 0x50, 0x4E, 0x47])),
            GroupId::from_hex("0102030405060708090a0b0c0d0e0f10")?,
            GroupType::Signal,
        )?;
        let bytes = stored.serialize()?;

        let mut current = GroupModel::deserialize(&bytes)?;
        current.remove_member("b")?;
        current.set_avatar(None);

        let names = |id: &str| (id == "b").then(|| "Bob".to_string());
        let describer = UpdateDescriber::new(&names);
        assert_eq!(
            describer.describe(&stored, &current),
            vec!["group avatar changed", "Bob removed"]
        );
        assert_eq!(
            describer.notice(&stored, &current),
            "group avatar changed; Bob removed"
        );
        Ok(())
    }
}
