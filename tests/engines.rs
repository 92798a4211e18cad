use std::sync::{Arc, Mutex, OnceLock};

use ecs_runtime::prelude::*;
use ecs_runtime::{ECSError, GroupId, KindId, SharedHandle};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Stat {
    n: i32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Flag {
    raised: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Other {
    v: u8,
}

/// Caller-owned implementor backing a reference-composed component.
struct Label {
    text: String,
}

struct Defs {
    pair: KindId,
    tagged: KindId,
    lone: KindId,
}

fn defs() -> &'static Defs {
    static DEFS: OnceLock<Defs> = OnceLock::new();
    DEFS.get_or_init(|| {
        let stat = register_component::<Stat>();
        let flag = register_component::<Flag>();
        let other = register_component::<Other>();
        let label = register_implementor::<Label>();
        let pair = register_kind("pair", &[stat, flag]);
        let tagged = register_kind("tagged", &[label, stat]);
        let lone = register_kind("lone", &[other]);
        freeze_definitions();
        Defs { pair, tagged, lone }
    })
}

#[derive(Clone, Debug, PartialEq)]
enum Event {
    Added { engine: &'static str, entity: u32, group: u32 },
    Removed { engine: &'static str, entity: u32, group: u32 },
}

type EventLog = Arc<Mutex<Vec<Event>>>;

/// Records every notification it receives, verbatim.
struct RecordingEngine {
    name: &'static str,
    interest: Signature,
    log: EventLog,
}

impl Engine for RecordingEngine {
    fn name(&self) -> &'static str {
        self.name
    }

    fn interest(&self) -> Signature {
        self.interest
    }

    fn on_add(&mut self, entity: EntityView<'_>, _requests: &EntityRequests) {
        self.log.lock().unwrap().push(Event::Added {
            engine: self.name,
            entity: entity.entity(),
            group: entity.group(),
        });
    }

    fn on_remove(&mut self, entity: EntityView<'_>, _requests: &EntityRequests) {
        self.log.lock().unwrap().push(Event::Removed {
            engine: self.name,
            entity: entity.entity(),
            group: entity.group(),
        });
    }
}

fn recording(name: &'static str, components: &[ecs_runtime::ComponentId], log: &EventLog) -> Box<RecordingEngine> {
    Box::new(RecordingEngine {
        name,
        interest: build_signature(components),
        log: Arc::clone(log),
    })
}

#[test]
fn add_fires_after_full_component_commit() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    // Observes both declared components inside the callback; a partially
    // committed entity would surface as a None read here.
    struct BothOrNothing {
        observed: Arc<Mutex<Vec<(Stat, Flag)>>>,
    }
    impl Engine for BothOrNothing {
        fn name(&self) -> &'static str { "both_or_nothing" }
        fn interest(&self) -> Signature {
            build_signature(&[component_id_of::<Stat>(), component_id_of::<Flag>()])
        }
        fn on_add(&mut self, entity: EntityView<'_>, _requests: &EntityRequests) {
            let stat = *entity.component::<Stat>().expect("stat committed");
            let flag = *entity.component::<Flag>().expect("flag committed");
            self.observed.lock().unwrap().push((stat, flag));
        }
    }

    let observed = Arc::new(Mutex::new(Vec::new()));
    root.register_engine(Box::new(BothOrNothing { observed: Arc::clone(&observed) }));

    let mut values = ValueSet::new();
    values.insert(Stat { n: 5 });
    values.insert(Flag { raised: true });
    requests
        .build_with(defs.pair, 1, 1, values, Vec::new())
        .unwrap();
    root.submit();

    assert_eq!(
        observed.lock().unwrap().as_slice(),
        &[(Stat { n: 5 }, Flag { raised: true })]
    );
}

#[test]
fn overlapping_interest_notifies_each_match_exactly_once() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    root.register_engine(recording("stat_watcher", &[component_id_of::<Stat>()], &log));
    root.register_engine(recording("flag_watcher", &[component_id_of::<Flag>()], &log));
    root.register_engine(recording(
        "pair_watcher",
        &[component_id_of::<Stat>(), component_id_of::<Flag>()],
        &log,
    ));
    root.register_engine(recording("other_watcher", &[component_id_of::<Other>()], &log));

    requests.build(defs.pair, 3, 2).unwrap();
    let stats = root.submit();

    // Three of four engines match; registration order decides dispatch order.
    assert_eq!(stats.notifications, 3);
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            Event::Added { engine: "stat_watcher", entity: 3, group: 2 },
            Event::Added { engine: "flag_watcher", entity: 3, group: 2 },
            Event::Added { engine: "pair_watcher", entity: 3, group: 2 },
        ]
    );
}

#[test]
fn group_swap_dispatches_remove_then_add() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    root.register_engine(recording("watcher", &[component_id_of::<Stat>()], &log));

    let mut values = ValueSet::new();
    values.insert(Stat { n: 9 });
    requests
        .build_with(defs.pair, 6, 10, values, Vec::new())
        .unwrap();
    root.submit();
    log.lock().unwrap().clear();

    requests.swap_group(6, 10, 11).unwrap();
    root.submit();

    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            Event::Removed { engine: "watcher", entity: 6, group: 10 },
            Event::Added { engine: "watcher", entity: 6, group: 11 },
        ]
    );

    // Data moved with the entity.
    assert!(root.query::<Stat>(defs.pair, 10).is_empty());
    assert_eq!(root.query::<Stat>(defs.pair, 11), &[Stat { n: 9 }]);
}

#[test]
fn remove_callback_observes_final_values() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    struct LastWords {
        seen: Arc<Mutex<Vec<i32>>>,
    }
    impl Engine for LastWords {
        fn name(&self) -> &'static str { "last_words" }
        fn interest(&self) -> Signature {
            build_signature(&[component_id_of::<Stat>()])
        }
        fn on_remove(&mut self, entity: EntityView<'_>, _requests: &EntityRequests) {
            let stat = entity.component::<Stat>().expect("final value readable");
            self.seen.lock().unwrap().push(stat.n);
        }
    }

    let seen = Arc::new(Mutex::new(Vec::new()));
    root.register_engine(Box::new(LastWords { seen: Arc::clone(&seen) }));

    requests.build(defs.pair, 4, 20).unwrap();
    root.submit();

    // Mutate in place between cycles, then remove.
    root.query_mut::<Stat>(defs.pair, 20)[0].n = 42;
    requests.remove(4, 20).unwrap();
    root.submit();

    assert_eq!(seen.lock().unwrap().as_slice(), &[42]);
}

#[test]
fn callbacks_may_enqueue_against_the_notified_entity() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    const HOME: GroupId = 30;
    const AWAY: GroupId = 31;

    // On arrival in its home group, sends the entity away and retires it —
    // both requests land in the next cycle, in enqueue order.
    struct Dispatcher {
        log: EventLog,
    }
    impl Engine for Dispatcher {
        fn name(&self) -> &'static str { "dispatcher" }
        fn interest(&self) -> Signature {
            build_signature(&[component_id_of::<Stat>()])
        }
        fn on_add(&mut self, entity: EntityView<'_>, requests: &EntityRequests) {
            self.log.lock().unwrap().push(Event::Added {
                engine: "dispatcher",
                entity: entity.entity(),
                group: entity.group(),
            });
            if entity.group() == HOME {
                requests.swap_group(entity.entity(), HOME, AWAY).unwrap();
                requests.remove(entity.entity(), AWAY).unwrap();
            }
        }
        fn on_remove(&mut self, entity: EntityView<'_>, _requests: &EntityRequests) {
            self.log.lock().unwrap().push(Event::Removed {
                engine: "dispatcher",
                entity: entity.entity(),
                group: entity.group(),
            });
        }
    }

    root.register_engine(Box::new(Dispatcher { log: Arc::clone(&log) }));

    requests.build(defs.pair, 2, HOME).unwrap();
    root.submit();
    let follow_up = root.submit();

    assert_eq!(follow_up.swapped, 1);
    assert_eq!(follow_up.removed, 1);
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &[
            Event::Added { engine: "dispatcher", entity: 2, group: HOME },
            Event::Removed { engine: "dispatcher", entity: 2, group: HOME },
            Event::Added { engine: "dispatcher", entity: 2, group: AWAY },
            Event::Removed { engine: "dispatcher", entity: 2, group: AWAY },
        ]
    );
    assert!(!root.is_alive(Egid::new(2, HOME)));
    assert!(!root.is_alive(Egid::new(2, AWAY)));
}

#[test]
fn implementor_backed_components_are_reachable() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    struct Greeter {
        greetings: Arc<Mutex<Vec<(String, i32)>>>,
    }
    impl Engine for Greeter {
        fn name(&self) -> &'static str { "greeter" }
        fn interest(&self) -> Signature {
            build_signature(&[component_id_of::<Label>()])
        }
        fn on_add(&mut self, entity: EntityView<'_>, _requests: &EntityRequests) {
            // Value slots commit before implementor slots, so the value
            // component is already initialized here.
            let label = entity.implementor::<Label>().expect("implementor reachable");
            let stat = entity.component::<Stat>().expect("value initialized");
            self.greetings.lock().unwrap().push((label.text.clone(), stat.n));
        }
    }

    let greetings = Arc::new(Mutex::new(Vec::new()));
    root.register_engine(Box::new(Greeter { greetings: Arc::clone(&greetings) }));

    let mut values = ValueSet::new();
    values.insert(Stat { n: 8 });
    let implementor: SharedHandle = Arc::new(Label { text: "named".to_string() });
    requests
        .build_with(defs.tagged, 1, 40, values, vec![implementor])
        .unwrap();
    root.submit();

    assert_eq!(
        greetings.lock().unwrap().as_slice(),
        &[("named".to_string(), 8)]
    );
    assert_eq!(
        root.shared::<Label>(Egid::new(1, 40)).unwrap().text,
        "named"
    );
}

#[test]
fn missing_implementors_are_rejected_at_enqueue() {
    let defs = defs();
    let root = ECSRoot::new();
    let requests = root.requests();

    let result = requests.build(defs.tagged, 5, 41);
    assert!(matches!(result, Err(ECSError::ImplementorMismatch(_))));
}

#[test]
fn uninterested_engines_hear_nothing() {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));

    root.register_engine(recording("stat_watcher", &[component_id_of::<Stat>()], &log));

    requests.build(defs.lone, 1, 50).unwrap();
    let stats = root.submit();

    assert_eq!(stats.notifications, 0);
    assert!(log.lock().unwrap().is_empty());
}
