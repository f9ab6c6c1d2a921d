#![no_main]
use libfuzzer_sys::fuzz_target;
use arbitrary::Arbitrary;
use shield_group_model::{
    Avatar, GroupId, GroupModel, GroupType, RawIdResolver, UpdateDescriber, GROUP_ID_LENGTH,
};

/// Fuzz group snapshot equality and the update describer.
///
/// Tests:
/// - describe(m, m) is always empty
/// - equality is symmetric
/// - equal snapshots produce no description
/// - added/removed counts match the member set difference
/// - snapshot bincode round-trip

#[derive(Arbitrary, Debug)]
struct Snapshot {
    name: Option<String>,
    members: Vec<String>,
    admin_picks: Vec<u8>,
    avatar: Option<Vec<u8>>,
    type_tag: u8,
}

#[derive(Arbitrary, Debug)]
struct DiffInput {
    id: [u8; GROUP_ID_LENGTH],
    old: Snapshot,
    new: Snapshot,
}

fn build(id: GroupId, snap: &Snapshot) -> GroupModel {
    let group_type = match snap.type_tag % 3 {
        0 => GroupType::Signal,
        1 => GroupType::PublicChat,
        _ => GroupType::RssFeed,
    };
    let mut model = GroupModel::new(
        snap.name.clone(),
        Vec::new(),
        snap.avatar.clone().map(Avatar::new),
        id,
        group_type,
    );
    for member in snap.members.iter().take(64) {
        let _ = model.add_member(member.clone()); // duplicates rejected
    }
    let members: Vec<String> = model.member_ids().to_vec();
    if !members.is_empty() {
        for pick in &snap.admin_picks {
            let _ = model.promote_admin(&members[*pick as usize % members.len()]);
        }
    }
    model
}

fuzz_target!(|input: DiffInput| {
    let id = GroupId::from_bytes(input.id);
    let old = build(id, &input.old);
    let new = build(id, &input.new);

    old.validate().expect("mutators keep invariants");
    new.validate().expect("mutators keep invariants");

    let describer = UpdateDescriber::new(&RawIdResolver);

    assert!(describer.describe(&old, &old).is_empty());
    assert_eq!(old == new, new == old);

    let changes = describer.describe_changes(&old, &new);
    if old == new {
        assert!(changes.is_empty());
    }

    let added = new.member_ids().iter().filter(|m| !old.is_member(m)).count();
    let removed = old.member_ids().iter().filter(|m| !new.is_member(m)).count();
    let member_changes = changes.iter().filter(|c| c.member_id().is_some()).count();
    assert_eq!(member_changes, added + removed);

    if let Ok(bytes) = old.serialize() {
        let decoded = GroupModel::deserialize(&bytes).expect("round-trip");
        assert_eq!(decoded, old);
    }
});
