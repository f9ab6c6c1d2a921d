/// Group conversation state and update notices.
///
/// A group is represented as a `GroupModel` snapshot. Group updates either
/// mutate a snapshot in place or replace it with a newer one; the
/// `UpdateDescriber` turns a pair of snapshots into the system-notice text
/// shown in the conversation.
///
/// # Module structure
/// - `ids` — GroupId identifier type
/// - `limits` — Process-wide constants (id length, notice text)
/// - `model` — GroupModel, GroupType, Avatar, invariant checks
/// - `describe` — UpdateDescriber, GroupUpdate, display-name resolution
pub mod describe;
pub mod ids;
pub mod limits;
pub mod model;

// Re-export core types for convenience
pub use describe::{
    describe_update, render_notice, DisplayNameResolver, GroupUpdate, RawIdResolver,
    UpdateDescriber,
};
pub use ids::GroupId;
pub use limits::{GENERIC_UPDATE_NOTICE, GROUP_ID_LENGTH, NOTICE_SEPARATOR};
pub use model::{Avatar, GroupModel, GroupModelError, GroupType};
