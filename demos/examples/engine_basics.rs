// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collision engine basics.
//!
//! Register a player and some walls, walk the player around, and read the
//! collision pairs each tick.
//!
//! Run:
//! - `cargo run -p thicket_demos --example engine_basics`

use kurbo::Rect;
use thicket_engine::{ColliderState, CollisionEngine};

fn main() {
    let mut engine = CollisionEngine::new(Rect::new(0.0, 0.0, 640.0, 480.0));

    let player = engine
        .insert(&ColliderState::new(Rect::new(10.0, 200.0, 26.0, 232.0)))
        .unwrap();
    let wall = engine
        .insert(&ColliderState::new_static(Rect::new(
            300.0, 0.0, 316.0, 480.0,
        )))
        .unwrap();
    let pickup = engine
        .insert(&ColliderState::new(Rect::new(150.0, 210.0, 160.0, 220.0)))
        .unwrap();

    // Walk the player to the right until it hits the wall.
    let mut x = 10.0;
    for tick in 0..40 {
        x += 8.0;
        engine
            .set_bounds(player, Rect::new(x, 200.0, x + 16.0, 232.0))
            .unwrap();
        engine.update();

        let others: Vec<_> = engine.collisions_with(player).collect();
        for other in others {
            if other == wall {
                println!("tick {tick}: bumped the wall, stopping");
                return;
            }
            if other == pickup {
                println!("tick {tick}: picked something up");
                engine.remove(pickup).unwrap();
            }
        }
    }
    println!("never reached the wall");
}
