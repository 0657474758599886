// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Broad-phase collision detection for 2D games.
//!
//! [`CollisionEngine`] registers colliders (axis-aligned rectangles with
//! static/enabled flags), tracks their movement through cheap dirty flags,
//! and on each [`update`](CollisionEngine::update) publishes the exact set
//! of overlapping pairs. Internally it keeps two
//! [`DynamicBoxTree`](thicket_tree::DynamicBoxTree)s, one for kinetic and
//! one for static colliders, so static geometry is never tested against
//! itself.
//!
//! Overlap is open-interval throughout: rectangles that merely share an
//! edge or a corner do not collide.
//!
//! # Example
//!
//! ```
//! use kurbo::Rect;
//! use thicket_engine::{CollisionEngine, ColliderState, CollisionPair};
//!
//! let mut engine = CollisionEngine::new(Rect::new(0.0, 0.0, 1000.0, 1000.0));
//!
//! let player = engine
//!     .insert(&ColliderState::new(Rect::new(0.0, 0.0, 10.0, 10.0)))
//!     .unwrap();
//! let wall = engine
//!     .insert(&ColliderState::new_static(Rect::new(100.0, 0.0, 110.0, 10.0)))
//!     .unwrap();
//!
//! engine.update();
//! assert!(engine.collisions().is_empty());
//!
//! // Walk the player into the wall.
//! engine.set_bounds(player, Rect::new(95.0, 0.0, 105.0, 10.0)).unwrap();
//! engine.update();
//! assert_eq!(engine.collisions(), &[CollisionPair::new(player, wall)]);
//! ```
//!
//! The engine is single-threaded by construction. Mutation goes through
//! `&mut self`, and the record store shared with the trees' accessors is an
//! `Rc`, so the engine is neither `Send` nor `Sync`.

#![no_std]

extern crate alloc;

mod collider;
mod engine;
mod error;

pub use collider::{Collider, ColliderFlags, ColliderId, ColliderState, CollisionPair};
pub use engine::CollisionEngine;
pub use error::EngineError;
