/// Update describer — human-readable notices for group state transitions.
///
/// Compares an old and a new `GroupModel` and lists what changed, always in
/// the same order: title, avatar, members added (new-model order), members
/// removed (old-model order). Member ids are turned into display names by a
/// caller-supplied `DisplayNameResolver`; ids it cannot resolve are shown raw.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::BuildHasher;

use crate::group::limits::{GENERIC_UPDATE_NOTICE, NOTICE_SEPARATOR};
use crate::group::model::GroupModel;

// ---------------------------------------------------------------------------
// DisplayNameResolver
// ---------------------------------------------------------------------------

/// Maps a member id to a display name. `None` means unknown.
pub trait DisplayNameResolver {
    fn display_name(&self, member_id: &str) -> Option<String>;
}

impl<F> DisplayNameResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn display_name(&self, member_id: &str) -> Option<String> {
        self(member_id)
    }
}

impl<S: BuildHasher> DisplayNameResolver for HashMap<String, String, S> {
    fn display_name(&self, member_id: &str) -> Option<String> {
        self.get(member_id).cloned()
    }
}

/// Resolver with no directory; every member is shown by raw id.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawIdResolver;

impl DisplayNameResolver for RawIdResolver {
    fn display_name(&self, _member_id: &str) -> Option<String> {
        None
    }
}

// ---------------------------------------------------------------------------
// GroupUpdate
// ---------------------------------------------------------------------------

/// One detected change between two group snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupUpdate {
    /// New title, or `None` if the title was cleared.
    TitleChanged(Option<String>),
    AvatarChanged,
    MemberAdded {
        member_id: String,
        display_name: String,
    },
    MemberRemoved {
        member_id: String,
        display_name: String,
    },
}

impl GroupUpdate {
    /// The member this update is about, if any.
    pub fn member_id(&self) -> Option<&str> {
        match self {
            GroupUpdate::MemberAdded { member_id, .. }
            | GroupUpdate::MemberRemoved { member_id, .. } => Some(member_id),
            _ => None,
        }
    }

    /// Render as seen by the local account: updates about `local_member_id`
    /// are phrased in the second person.
    pub fn text_for_local(&self, local_member_id: &str) -> String {
        match self {
            GroupUpdate::MemberAdded { member_id, .. } if member_id == local_member_id => {
                "you were added".to_string()
            }
            GroupUpdate::MemberRemoved { member_id, .. } if member_id == local_member_id => {
                "you were removed".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for GroupUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupUpdate::TitleChanged(Some(title)) => write!(f, "title changed to {}", title),
            GroupUpdate::TitleChanged(None) => write!(f, "title removed"),
            GroupUpdate::AvatarChanged => write!(f, "group avatar changed"),
            GroupUpdate::MemberAdded { display_name, .. } => write!(f, "{} added", display_name),
            GroupUpdate::MemberRemoved { display_name, .. } => {
                write!(f, "{} removed", display_name)
            }
        }
    }
}

/// Join descriptions into a single notice line.
pub fn render_notice(updates: &[GroupUpdate]) -> String {
    join_notice(updates.iter().map(|u| u.to_string()).collect())
}

fn join_notice(lines: Vec<String>) -> String {
    if lines.is_empty() {
        return GENERIC_UPDATE_NOTICE.to_string();
    }
    lines.join(NOTICE_SEPARATOR)
}

// ---------------------------------------------------------------------------
// UpdateDescriber
// ---------------------------------------------------------------------------

/// Stateless diff of two snapshots. Holds only borrowed collaborators.
pub struct UpdateDescriber<'a, R: DisplayNameResolver + ?Sized> {
    resolver: &'a R,
    local_member_id: Option<&'a str>,
}

impl<'a, R: DisplayNameResolver + ?Sized> UpdateDescriber<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        UpdateDescriber {
            resolver,
            local_member_id: None,
        }
    }

    /// Phrase updates about this member as "you ..." in rendered text.
    pub fn with_local_member(mut self, local_member_id: &'a str) -> Self {
        self.local_member_id = Some(local_member_id);
        self
    }

    /// Structured list of changes from `old` to `new`. Never mutates either.
    pub fn describe_changes(&self, old: &GroupModel, new: &GroupModel) -> Vec<GroupUpdate> {
        let mut updates = Vec::new();

        if old.name() != new.name() {
            updates.push(GroupUpdate::TitleChanged(new.name().map(str::to_string)));
        }

        if old.avatar() != new.avatar() {
            updates.push(GroupUpdate::AvatarChanged);
        }

        let old_members: HashSet<&str> = old.member_ids().iter().map(String::as_str).collect();
        let new_members: HashSet<&str> = new.member_ids().iter().map(String::as_str).collect();

        for member_id in new.member_ids() {
            if !old_members.contains(member_id.as_str()) {
                updates.push(GroupUpdate::MemberAdded {
                    display_name: self.resolve(member_id),
                    member_id: member_id.clone(),
                });
            }
        }

        for member_id in old.member_ids() {
            if !new_members.contains(member_id.as_str()) {
                updates.push(GroupUpdate::MemberRemoved {
                    display_name: self.resolve(member_id),
                    member_id: member_id.clone(),
                });
            }
        }

        log::debug!(
            "Group {} -> {}: {} change(s)",
            old.id(),
            new.id(),
            updates.len()
        );
        updates
    }

    /// Human-readable descriptions, one per change. Empty when nothing changed.
    pub fn describe(&self, old: &GroupModel, new: &GroupModel) -> Vec<String> {
        self.describe_changes(old, new)
            .iter()
            .map(|update| self.render(update))
            .collect()
    }

    /// Single-line notice; falls back to a generic text when nothing changed.
    pub fn notice(&self, old: &GroupModel, new: &GroupModel) -> String {
        join_notice(self.describe(old, new))
    }

    fn render(&self, update: &GroupUpdate) -> String {
        match self.local_member_id {
            Some(local) => update.text_for_local(local),
            None => update.to_string(),
        }
    }

    fn resolve(&self, member_id: &str) -> String {
        match self.resolver.display_name(member_id) {
            Some(name) if !name.trim().is_empty() => name,
            _ => {
                log::debug!("No display name for {}, using raw id", member_id);
                member_id.to_string()
            }
        }
    }
}

/// Describe the update from `old` to `new` using `resolver` for names.
pub fn describe_update<R: DisplayNameResolver + ?Sized>(
    old: &GroupModel,
    new: &GroupModel,
    resolver: &R,
) -> Vec<String> {
    UpdateDescriber::new(resolver).describe(old, new)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
