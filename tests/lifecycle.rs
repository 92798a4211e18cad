use std::sync::OnceLock;

use ecs_runtime::prelude::*;
use ecs_runtime::{ECSError, KindId};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Health {
    hp: i32,
}

struct Defs {
    creature: KindId,
}

fn defs() -> &'static Defs {
    static DEFS: OnceLock<Defs> = OnceLock::new();
    DEFS.get_or_init(|| {
        let position = register_component::<Position>();
        let health = register_component::<Health>();
        let creature = register_kind("creature", &[position, health]);
        freeze_definitions();
        Defs { creature }
    })
}

#[test]
fn build_then_query_round_trip() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    let mut values = ValueSet::new();
    values.insert(Position { x: 1.0, y: 2.0 });
    values.insert(Health { hp: 30 });
    requests
        .build_with(defs.creature, 7, 3, values, Vec::new())
        .unwrap();

    let stats = root.submit();
    assert_eq!(stats.built, 1);

    let positions = root.query::<Position>(defs.creature, 3);
    assert_eq!(positions.len(), 1);
    assert_eq!(positions[0], Position { x: 1.0, y: 2.0 });

    let healths = root.query::<Health>(defs.creature, 3);
    assert_eq!(healths[0], Health { hp: 30 });

    assert!(root.is_alive(Egid::new(7, 3)));
    assert_eq!(root.entities(defs.creature, 3), &[7]);
}

#[test]
fn unspecified_values_default_construct() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    requests.build(defs.creature, 1, 10).unwrap();
    root.submit();

    assert_eq!(root.query::<Position>(defs.creature, 10)[0], Position::default());
    assert_eq!(root.query::<Health>(defs.creature, 10)[0], Health::default());
}

#[test]
fn build_then_remove_same_cycle_is_invisible() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    requests.build(defs.creature, 4, 1).unwrap();
    requests.remove(4, 1).unwrap();

    let stats = root.submit();
    assert_eq!(stats.built, 0);
    assert_eq!(stats.removed, 0);
    assert_eq!(stats.notifications, 0);
    assert!(root.query::<Health>(defs.creature, 1).is_empty());
    assert!(!root.is_alive(Egid::new(4, 1)));
}

#[test]
fn swap_remove_keeps_survivors_consistent() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    for id in 0..5u32 {
        let mut values = ValueSet::new();
        values.insert(Health { hp: id as i32 * 10 });
        requests
            .build_with(defs.creature, id, 2, values, Vec::new())
            .unwrap();
    }
    root.submit();

    // Remove an internal slot, not the last one.
    requests.remove(1, 2).unwrap();
    root.submit();

    let entities = root.entities(defs.creature, 2).to_vec();
    assert_eq!(entities.len(), 4);
    assert!(!entities.contains(&1));

    // Every survivor resolves through the location index to a slot holding
    // its own value, even though slots were shuffled by the swap-remove.
    let healths = root.query::<Health>(defs.creature, 2).to_vec();
    for (slot, id) in entities.iter().enumerate() {
        assert_eq!(healths[slot], Health { hp: *id as i32 * 10 });
        assert_eq!(
            root.value::<Health>(Egid::new(*id, 2)),
            Some(&Health { hp: *id as i32 * 10 })
        );
    }
}

#[test]
fn empty_query_is_not_an_error() {
    let defs = defs();
    let root = ECSRoot::new();

    assert_eq!(root.query::<Position>(defs.creature, 999).len(), 0);
    assert!(root.entities(defs.creature, 999).is_empty());
}

#[test]
fn duplicate_pending_build_is_rejected() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    let mut values = ValueSet::new();
    values.insert(Health { hp: 1 });
    requests
        .build_with(defs.creature, 9, 5, values, Vec::new())
        .unwrap();

    let second = requests.build(defs.creature, 9, 5);
    assert!(matches!(second, Err(ECSError::DuplicateRequest(_))));

    // The first request is unaffected by the rejected duplicate.
    root.submit();
    assert_eq!(root.query::<Health>(defs.creature, 5), &[Health { hp: 1 }]);
}

#[test]
fn duplicate_live_build_is_rejected() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    requests.build(defs.creature, 2, 6).unwrap();
    root.submit();

    let duplicate = requests.build(defs.creature, 2, 6);
    assert!(matches!(duplicate, Err(ECSError::DuplicateEntity(_))));
}

#[test]
fn unknown_targets_are_rejected() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    assert!(matches!(
        requests.remove(42, 7),
        Err(ECSError::UnknownEntity(_))
    ));
    assert!(matches!(
        requests.swap_group(42, 7, 8),
        Err(ECSError::UnknownEntity(_))
    ));

    requests.build(defs.creature, 42, 7).unwrap();
    root.submit();
    assert!(requests.swap_group(42, 7, 8).is_ok());
}

#[test]
fn swap_onto_occupied_identity_is_rejected() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    requests.build(defs.creature, 1, 20).unwrap();
    requests.build(defs.creature, 1, 21).unwrap();
    root.submit();

    assert!(matches!(
        requests.swap_group(1, 20, 21),
        Err(ECSError::DuplicateEntity(_))
    ));
}

#[test]
fn same_entity_id_may_live_in_different_groups() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    requests.build(defs.creature, 11, 30).unwrap();
    requests.build(defs.creature, 11, 31).unwrap();
    root.submit();

    assert!(root.is_alive(Egid::new(11, 30)));
    assert!(root.is_alive(Egid::new(11, 31)));
}

#[test]
fn remove_then_rebuild_within_one_cycle_applies_in_order() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    let mut values = ValueSet::new();
    values.insert(Health { hp: 1 });
    requests
        .build_with(defs.creature, 3, 40, values, Vec::new())
        .unwrap();
    root.submit();

    requests.remove(3, 40).unwrap();
    let mut values = ValueSet::new();
    values.insert(Health { hp: 2 });
    requests
        .build_with(defs.creature, 3, 40, values, Vec::new())
        .unwrap();

    let stats = root.submit();
    assert_eq!(stats.removed, 1);
    assert_eq!(stats.built, 1);
    assert_eq!(root.query::<Health>(defs.creature, 40), &[Health { hp: 2 }]);
}

#[test]
fn preallocation_is_transparent() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    root.preallocate(defs.creature, 50, 1_000).unwrap();
    for id in 0..1_000u32 {
        requests.build(defs.creature, id, 50).unwrap();
    }
    let stats = root.submit();

    assert_eq!(stats.built, 1_000);
    assert_eq!(root.query::<Position>(defs.creature, 50).len(), 1_000);
    assert_eq!(root.live_count(), 1_000);
}

#[test]
fn mutations_between_cycles_are_observed() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    requests.build(defs.creature, 8, 60).unwrap();
    root.submit();

    for health in root.query_mut::<Health>(defs.creature, 60) {
        health.hp = 77;
    }
    assert_eq!(root.value::<Health>(Egid::new(8, 60)), Some(&Health { hp: 77 }));
}
