/// Group model — identity and membership state of one group conversation.
///
/// A `GroupModel` is a plain value: id, title, avatar, type, ordered member
/// and admin lists, plus ids the local client has marked as removed.
/// - Equality treats member and admin lists as sets.
/// - Admins must be members; locally removed ids must not be members.
/// - The id only changes through `update_group_id`, which is logged.

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use thiserror::Error;

use crate::group::ids::GroupId;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupModelError {
    #[error("Member listed more than once: {0}")]
    DuplicateMember(String),

    #[error("Admin is not a member: {0}")]
    AdminNotMember(String),

    #[error("Removed member is still an active member: {0}")]
    RemovedMemberStillActive(String),

    #[error("Already an active member: {0}")]
    AlreadyMember(String),

    #[error("Not a member: {0}")]
    NotMember(String),

    #[error("Not an admin: {0}")]
    NotAdmin(String),

    #[error("Unknown group type tag: {0}")]
    UnknownGroupType(i32),
}

// ---------------------------------------------------------------------------
// GroupType
// ---------------------------------------------------------------------------

/// Governance/transport model of the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum GroupType {
    #[default]
    Signal,
    PublicChat,
    RssFeed,
}

impl GroupType {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SIGNAL" => Some(GroupType::Signal),
            "PUBLIC_CHAT" => Some(GroupType::PublicChat),
            "RSS_FEED" => Some(GroupType::RssFeed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupType::Signal => "SIGNAL",
            GroupType::PublicChat => "PUBLIC_CHAT",
            GroupType::RssFeed => "RSS_FEED",
        }
    }

    /// Numeric tag used by legacy storage records.
    pub fn to_wire(self) -> i32 {
        match self {
            GroupType::Signal => 0,
            GroupType::PublicChat => 1,
            GroupType::RssFeed => 2,
        }
    }
}

impl TryFrom<i32> for GroupType {
    type Error = GroupModelError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(GroupType::Signal),
            1 => Ok(GroupType::PublicChat),
            2 => Ok(GroupType::RssFeed),
            other => Err(GroupModelError::UnknownGroupType(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Avatar
// ---------------------------------------------------------------------------

/// Opaque avatar image payload. Decoding is the presentation layer's job.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Avatar(Vec<u8>);

impl Avatar {
    pub fn new(bytes: Vec<u8>) -> Self {
        Avatar(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short BLAKE3 fingerprint, safe to log.
    pub fn fingerprint(&self) -> String {
        hex::encode(&blake3::hash(&self.0).as_bytes()[..8])
    }
}

impl From<Vec<u8>> for Avatar {
    fn from(bytes: Vec<u8>) -> Self {
        Avatar(bytes)
    }
}

impl fmt::Debug for Avatar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Avatar({} bytes, {})", self.0.len(), self.fingerprint())
    }
}

// ---------------------------------------------------------------------------
// GroupModel
// ---------------------------------------------------------------------------

/// Loading through serde runs the same invariant checks as `validate`, so a
/// malformed stored snapshot fails to decode.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "GroupModelRecord")]
pub struct GroupModel {
    id: GroupId,
    name: Option<String>,
    /// Insertion order is kept for display.
    member_ids: Vec<String>,
    admin_ids: Vec<String>,
    group_type: GroupType,
    /// Ids marked removed locally; never also in `member_ids`.
    removed_members: BTreeSet<String>,
    avatar: Option<Avatar>,
}

impl GroupModel {
    /// Create a group snapshot. Admins and locally removed members start empty.
    ///
    /// Member ids are taken as given; use `try_new` or `validate` when they
    /// may contain duplicates.
    pub fn new(
        title: Option<String>,
        member_ids: Vec<String>,
        avatar: Option<Avatar>,
        id: GroupId,
        group_type: GroupType,
    ) -> Self {
        GroupModel {
            id,
            name: title,
            member_ids,
            admin_ids: Vec::new(),
            group_type,
            removed_members: BTreeSet::new(),
            avatar,
        }
    }

    /// Create a snapshot with admins already assigned, rejecting malformed input.
    pub fn try_new(
        title: Option<String>,
        member_ids: Vec<String>,
        admin_ids: Vec<String>,
        avatar: Option<Avatar>,
        id: GroupId,
        group_type: GroupType,
    ) -> Result<Self, GroupModelError> {
        let mut model = GroupModel::new(title, member_ids, avatar, id, group_type);
        model.admin_ids = admin_ids;
        model.validate()?;
        Ok(model)
    }

    pub fn id(&self) -> &GroupId {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn member_ids(&self) -> &[String] {
        &self.member_ids
    }

    pub fn admin_ids(&self) -> &[String] {
        &self.admin_ids
    }

    pub fn group_type(&self) -> GroupType {
        self.group_type
    }

    pub fn removed_members(&self) -> &BTreeSet<String> {
        &self.removed_members
    }

    pub fn avatar(&self) -> Option<&Avatar> {
        self.avatar.as_ref()
    }

    pub fn is_member(&self, member_id: &str) -> bool {
        self.member_ids.iter().any(|m| m == member_id)
    }

    pub fn is_admin(&self, member_id: &str) -> bool {
        self.admin_ids.iter().any(|a| a == member_id)
    }

    pub fn is_marked_removed(&self, member_id: &str) -> bool {
        self.removed_members.contains(member_id)
    }

    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }

    // -----------------------------------------------------------------------
    // Equality
    // -----------------------------------------------------------------------

    /// Field-wise comparison with member and admin lists compared as sets.
    /// Locally removed members are bookkeeping and do not participate.
    pub fn is_equal_to_group_model(&self, other: &GroupModel) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.id == other.id
            && same_members(&self.member_ids, &other.member_ids)
            && same_members(&self.admin_ids, &other.admin_ids)
            && self.name == other.name
            && self.avatar == other.avatar
            && self.group_type == other.group_type
    }

    /// Equality against an arbitrary value. Anything that is not a
    /// `GroupModel` compares unequal.
    pub fn eq_any(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<GroupModel>()
            .is_some_and(|model| self.is_equal_to_group_model(model))
    }

    // -----------------------------------------------------------------------
    // Identifier rotation
    // -----------------------------------------------------------------------

    /// Replace the group id, e.g. when a group is migrated to a new address.
    pub fn update_group_id(&mut self, new_id: GroupId) {
        log::info!("Rotating group id {} -> {}", self.id, new_id);
        self.id = new_id;
    }

    // -----------------------------------------------------------------------
    // Group-update operations
    // -----------------------------------------------------------------------

    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub fn set_avatar(&mut self, avatar: Option<Avatar>) {
        self.avatar = avatar;
    }

    /// Append a member. A locally removed id becomes active again.
    pub fn add_member(&mut self, member_id: impl Into<String>) -> Result<(), GroupModelError> {
        let member_id = member_id.into();
        if self.is_member(&member_id) {
            return Err(GroupModelError::AlreadyMember(member_id));
        }
        self.removed_members.remove(&member_id);
        self.member_ids.push(member_id);
        Ok(())
    }

    /// Drop a member, along with any admin role it held.
    pub fn remove_member(&mut self, member_id: &str) -> Result<(), GroupModelError> {
        let pos = self
            .member_ids
            .iter()
            .position(|m| m == member_id)
            .ok_or_else(|| GroupModelError::NotMember(member_id.to_string()))?;
        self.member_ids.remove(pos);
        self.admin_ids.retain(|a| a != member_id);
        Ok(())
    }

    /// Move a member into the locally removed set.
    pub fn mark_member_removed(&mut self, member_id: &str) -> Result<(), GroupModelError> {
        self.remove_member(member_id)?;
        self.removed_members.insert(member_id.to_string());
        Ok(())
    }

    /// Forget a locally removed id. Returns whether it was tracked.
    pub fn clear_removed_member(&mut self, member_id: &str) -> bool {
        self.removed_members.remove(member_id)
    }

    /// Grant admin to an existing member. Returns `false` if it already was one.
    pub fn promote_admin(&mut self, member_id: &str) -> Result<bool, GroupModelError> {
        if !self.is_member(member_id) {
            return Err(GroupModelError::NotMember(member_id.to_string()));
        }
        if self.is_admin(member_id) {
            return Ok(false);
        }
        self.admin_ids.push(member_id.to_string());
        Ok(true)
    }

    pub fn demote_admin(&mut self, member_id: &str) -> Result<(), GroupModelError> {
        let pos = self
            .admin_ids
            .iter()
            .position(|a| a == member_id)
            .ok_or_else(|| GroupModelError::NotAdmin(member_id.to_string()))?;
        self.admin_ids.remove(pos);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check the structural invariants. Nothing is repaired.
    pub fn validate(&self) -> Result<(), GroupModelError> {
        if let Err(e) = self.check_invariants() {
            log::warn!("Group {} failed validation: {}", self.id, e);
            return Err(e);
        }
        Ok(())
    }

    fn check_invariants(&self) -> Result<(), GroupModelError> {
        let mut members = HashSet::with_capacity(self.member_ids.len());
        for member in &self.member_ids {
            if !members.insert(member.as_str()) {
                return Err(GroupModelError::DuplicateMember(member.clone()));
            }
        }
        if let Some(admin) = self.admin_ids.iter().find(|a| !members.contains(a.as_str())) {
            return Err(GroupModelError::AdminNotMember(admin.clone()));
        }
        if let Some(removed) = self
            .removed_members
            .iter()
            .find(|r| members.contains(r.as_str()))
        {
            return Err(GroupModelError::RemovedMemberStillActive(removed.clone()));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Serialization
    // -----------------------------------------------------------------------

    pub fn serialize(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode a stored snapshot. Snapshots breaking the invariants are rejected.
    pub fn deserialize(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Stored form of a `GroupModel`, checked before it becomes one.
#[derive(Deserialize)]
struct GroupModelRecord {
    id: GroupId,
    name: Option<String>,
    member_ids: Vec<String>,
    admin_ids: Vec<String>,
    group_type: GroupType,
    removed_members: BTreeSet<String>,
    avatar: Option<Avatar>,
}

impl TryFrom<GroupModelRecord> for GroupModel {
    type Error = GroupModelError;

    fn try_from(record: GroupModelRecord) -> Result<Self, Self::Error> {
        let model = GroupModel {
            id: record.id,
            name: record.name,
            member_ids: record.member_ids,
            admin_ids: record.admin_ids,
            group_type: record.group_type,
            removed_members: record.removed_members,
            avatar: record.avatar,
        };
        model.validate()?;
        Ok(model)
    }
}

impl PartialEq for GroupModel {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal_to_group_model(other)
    }
}

impl Eq for GroupModel {}

fn same_members(a: &[String], b: &[String]) -> bool {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();
    a == b
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::limits::GROUP_ID_LENGTH;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn gid(byte: u8) -> GroupId {
        GroupId::from_bytes([byte; GROUP_ID_LENGTH])
    }

    fn team() -> GroupModel {
        GroupModel::try_new(
            Some("Team".to_string()),
            ids(&["alice", "bob"]),
            ids(&["alice"]),
            None,
            gid(1),
            GroupType::Signal,
        )
        .unwrap()
    }

    #[test]
    fn test_new_starts_without_admins_or_removed() {
        let model = GroupModel::new(
            None,
            ids(&["a", "b"]),
            None,
            gid(2),
            GroupType::PublicChat,
        );
        assert!(model.admin_ids().is_empty());
        assert!(model.removed_members().is_empty());
        assert_eq!(model.member_count(), 2);
        assert_eq!(model.group_type(), GroupType::PublicChat);
        assert!(model.name().is_none());
    }

    #[test]
    fn test_equality_is_reflexive_and_symmetric() {
        let a = team();
        let b = team();
        assert!(a.is_equal_to_group_model(&a));
        assert!(a.is_equal_to_group_model(&b));
        assert!(b.is_equal_to_group_model(&a));
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_ignores_member_order() {
        let a = team();
        let b = GroupModel::try_new(
            Some("Team".to_string()),
            ids(&["bob", "alice"]),
            ids(&["alice"]),
            None,
            gid(1),
            GroupType::Signal,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_ignores_admin_order() {
        let mut a = team();
        a.promote_admin("bob").unwrap();
        let b = GroupModel::try_new(
            Some("Team".to_string()),
            ids(&["alice", "bob"]),
            ids(&["bob", "alice"]),
            None,
            gid(1),
            GroupType::Signal,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_equality_sensitive_to_each_field() {
        let base = team();

        let mut renamed = team();
        renamed.set_name(Some("Other".to_string()));
        assert_ne!(base, renamed);

        let mut unnamed = team();
        unnamed.set_name(None);
        assert_ne!(base, unnamed);

        let mut with_avatar = team();
        with_avatar.set_avatar(Some(Avatar::new(vec![1, 2, 3])));
        assert_ne!(base, with_avatar);

        let mut other_avatar = with_avatar.clone();
        other_avatar.set_avatar(Some(Avatar::new(vec![1, 2, 4])));
        assert_ne!(with_avatar, other_avatar);

        let other_type = GroupModel::try_new(
            Some("Team".to_string()),
            ids(&["alice", "bob"]),
            ids(&["alice"]),
            None,
            gid(1),
            GroupType::RssFeed,
        )
        .unwrap();
        assert_ne!(base, other_type);

        let mut more_members = team();
        more_members.add_member("carol").unwrap();
        assert_ne!(base, more_members);

        let mut other_admins = team();
        other_admins.promote_admin("bob").unwrap();
        assert_ne!(base, other_admins);

        let mut other_id = team();
        other_id.update_group_id(gid(9));
        assert_ne!(base, other_id);
    }

    #[test]
    fn test_equality_ignores_removed_members() {
        let a = team();
        let mut b = team();
        b.add_member("carol").unwrap();
        b.mark_member_removed("carol").unwrap();
        assert!(b.is_marked_removed("carol"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_eq_any_rejects_other_kinds() {
        let model = team();
        assert!(model.eq_any(&team()));
        assert!(!model.eq_any(&"Team"));
        assert!(!model.eq_any(&42u32));
        assert!(!model.eq_any(model.id()));
    }

    #[test]
    fn test_rotation_matches_fresh_model() {
        let mut rotated = team();
        rotated.update_group_id(gid(7));

        let fresh = GroupModel::try_new(
            Some("Team".to_string()),
            ids(&["alice", "bob"]),
            ids(&["alice"]),
            None,
            gid(7),
            GroupType::Signal,
        )
        .unwrap();
        assert_eq!(rotated.id(), &gid(7));
        assert_eq!(rotated, fresh);
    }

    #[test]
    fn test_add_member_rejects_duplicates() {
        let mut model = team();
        assert_eq!(
            model.add_member("bob"),
            Err(GroupModelError::AlreadyMember("bob".to_string()))
        );
        model.add_member("carol").unwrap();
        assert_eq!(model.member_ids(), &ids(&["alice", "bob", "carol"])[..]);
    }

    #[test]
    fn test_add_member_reactivates_removed_id() {
        let mut model = team();
        model.mark_member_removed("bob").unwrap();
        assert!(!model.is_member("bob"));
        assert!(model.is_marked_removed("bob"));

        model.add_member("bob").unwrap();
        assert!(model.is_member("bob"));
        assert!(!model.is_marked_removed("bob"));
        model.validate().unwrap();
    }

    #[test]
    fn test_remove_member_drops_admin_role() {
        let mut model = team();
        model.remove_member("alice").unwrap();
        assert!(!model.is_member("alice"));
        assert!(!model.is_admin("alice"));
        assert_eq!(
            model.remove_member("alice"),
            Err(GroupModelError::NotMember("alice".to_string()))
        );
        model.validate().unwrap();
    }

    #[test]
    fn test_mark_removed_requires_membership() {
        let mut model = team();
        assert_eq!(
            model.mark_member_removed("mallory"),
            Err(GroupModelError::NotMember("mallory".to_string()))
        );
        assert!(model.removed_members().is_empty());

        model.mark_member_removed("alice").unwrap();
        assert!(!model.is_admin("alice"));
        assert!(model.clear_removed_member("alice"));
        assert!(!model.clear_removed_member("alice"));
    }

    #[test]
    fn test_promote_and_demote_admin() {
        let mut model = team();
        assert_eq!(model.promote_admin("bob"), Ok(true));
        assert_eq!(model.promote_admin("bob"), Ok(false));
        assert_eq!(model.admin_ids(), &ids(&["alice", "bob"])[..]);

        assert_eq!(
            model.promote_admin("mallory"),
            Err(GroupModelError::NotMember("mallory".to_string()))
        );

        model.demote_admin("alice").unwrap();
        assert_eq!(model.admin_ids(), &ids(&["bob"])[..]);
        assert_eq!(
            model.demote_admin("alice"),
            Err(GroupModelError::NotAdmin("alice".to_string()))
        );
    }

    #[test]
    fn test_try_new_rejects_admin_outside_members() {
        let err = GroupModel::try_new(
            None,
            ids(&["alice"]),
            ids(&["bob"]),
            None,
            gid(1),
            GroupType::Signal,
        )
        .unwrap_err();
        assert_eq!(err, GroupModelError::AdminNotMember("bob".to_string()));
    }

    #[test]
    fn test_validate_rejects_duplicate_members() {
        let model = GroupModel::new(None, ids(&["a", "b", "a"]), None, gid(1), GroupType::Signal);
        assert_eq!(
            model.validate(),
            Err(GroupModelError::DuplicateMember("a".to_string()))
        );

        let err = GroupModel::try_new(
            None,
            ids(&["a", "a"]),
            Vec::new(),
            None,
            gid(1),
            GroupType::Signal,
        )
        .unwrap_err();
        assert_eq!(err, GroupModelError::DuplicateMember("a".to_string()));
    }

    fn tampered_json(edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let mut model = team();
        model.add_member("carol").unwrap();
        model.mark_member_removed("carol").unwrap();
        let mut json: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
        edit(&mut json);
        json.to_string()
    }

    #[test]
    fn test_from_json_rejects_removed_member_still_active() {
        let json = tampered_json(|json| {
            json["member_ids"]
                .as_array_mut()
                .unwrap()
                .push(serde_json::Value::String("carol".to_string()));
        });
        let err = GroupModel::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("Removed member is still an active member: carol"));
    }

    #[test]
    fn test_from_json_rejects_admin_outside_members() {
        let json = tampered_json(|json| {
            json["admin_ids"] = serde_json::json!(["ghost"]);
        });
        let err = GroupModel::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("Admin is not a member: ghost"));
    }

    #[test]
    fn test_from_json_rejects_duplicate_members() {
        let json = tampered_json(|json| {
            json["member_ids"] = serde_json::json!(["a", "a"]);
            json["admin_ids"] = serde_json::json!([]);
        });
        let err = GroupModel::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("Member listed more than once: a"));
    }

    #[test]
    fn test_deserialize_rejects_malformed_snapshot() {
        let mut bad = team();
        // Bypass the mutators to build a snapshot no mutator would produce.
        bad.admin_ids.push("ghost".to_string());
        let bytes = bad.serialize().unwrap();
        assert!(GroupModel::deserialize(&bytes).is_err());

        let good = team().serialize().unwrap();
        assert_eq!(GroupModel::deserialize(&good).unwrap(), team());
    }

    #[test]
    fn test_group_type_tags() {
        for ty in [GroupType::Signal, GroupType::PublicChat, GroupType::RssFeed] {
            assert_eq!(GroupType::try_from(ty.to_wire()), Ok(ty));
            assert_eq!(GroupType::from_string(ty.as_str()), Some(ty));
        }
        assert_eq!(GroupType::from_string("public_chat"), Some(GroupType::PublicChat));
        assert_eq!(GroupType::from_string("mailing_list"), None);
        assert_eq!(
            GroupType::try_from(3),
            Err(GroupModelError::UnknownGroupType(3))
        );
        assert_eq!(GroupType::default(), GroupType::Signal);
    }

    #[test]
    fn test_avatar_debug_hides_payload() {
        let avatar = Avatar::new(vec![0xFF, 0xD8, 0xFF, 0xE0]);
        let shown = format!("{:?}", avatar);
        assert!(shown.starts_with("Avatar(4 bytes, "));
        assert!(!shown.contains('['));
        assert_eq!(avatar.fingerprint().len(), 16);
        assert_eq!(avatar.fingerprint(), Avatar::from(vec![0xFF, 0xD8, 0xFF, 0xE0]).fingerprint());
    }

    #[test]
    fn test_snapshot_serialization() {
        let mut model = team();
        model.set_avatar(Some(Avatar::new(vec![9, 8, 7])));
        model.add_member("carol").unwrap();
        model.mark_member_removed("carol").unwrap();

        let bytes = model.serialize().unwrap();
        let decoded = GroupModel::deserialize(&bytes).unwrap();
        assert_eq!(model, decoded);
        assert_eq!(decoded.member_ids(), model.member_ids());
        assert_eq!(decoded.removed_members(), model.removed_members());

        let json = model.to_json().unwrap();
        let from_json = GroupModel::from_json(&json).unwrap();
        assert_eq!(model, from_json);
        from_json.validate().unwrap();
    }
}
