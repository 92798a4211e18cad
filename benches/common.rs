#![allow(dead_code)]

use std::sync::OnceLock;

use ecs_runtime::prelude::*;
use ecs_runtime::KindId;

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Velocity {
    pub dx: f32,
    pub dy: f32,
}

pub struct Defs {
    pub agent: KindId,
}

pub fn defs() -> &'static Defs {
    static DEFS: OnceLock<Defs> = OnceLock::new();
    DEFS.get_or_init(|| {
        let position = register_component::<Position>();
        let velocity = register_component::<Velocity>();
        let agent = register_kind("agent", &[position, velocity]);
        freeze_definitions();
        Defs { agent }
    })
}

pub fn populated_root(count: usize) -> ECSRoot {
    let defs = defs();
    let mut root = ECSRoot::new();
    let requests = root.requests();

    root.preallocate(defs.agent, 1, count).unwrap();
    for id in 0..count as u32 {
        requests.build(defs.agent, id, 1).unwrap();
    }
    root.submit();
    root
}
