// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collider handles, flags, and the registration contract.

use kurbo::Rect;

/// Stable, copyable handle to a registered collider.
///
/// This is a small handle that stays valid across updates but becomes stale
/// when the collider is removed. It consists of a slot index and a
/// generation counter.
///
/// ## Semantics
///
/// - On insert, a fresh slot is allocated with generation `1`.
/// - On remove, the slot is freed; any existing `ColliderId` that pointed to
///   that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a
///   new, distinct `ColliderId`.
///
/// Stale ids never alias a different live collider because the generation
/// must match. Use [`CollisionEngine::is_alive`](crate::CollisionEngine::is_alive)
/// to check liveness.
///
/// The derived total order (slot, then generation) exists so ids can key
/// ordered maps and so pairs normalize deterministically; it carries no
/// other meaning.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ColliderId(pub(crate) u32, pub(crate) u32);

impl ColliderId {
    pub(crate) const fn new(slot: u32, generation: u32) -> Self {
        Self(slot, generation)
    }

    pub(crate) const fn slot(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Collider flags controlling classification and participation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ColliderFlags: u8 {
        /// Collider is static (world geometry). Two static colliders are
        /// never reported against each other.
        const STATIC  = 0b0000_0001;
        /// Collider participates in collision detection. Disabled colliders
        /// stay registered but produce no pairs.
        const ENABLED = 0b0000_0010;
    }
}

impl Default for ColliderFlags {
    fn default() -> Self {
        Self::ENABLED
    }
}

/// Registration contract for [`CollisionEngine::insert`](crate::CollisionEngine::insert).
///
/// The engine snapshots the implementor at registration; it never borrows
/// caller data past the call. After registration, state changes go through
/// the engine's setters, not through this trait.
pub trait Collider {
    /// The collider's current axis-aligned bounds.
    fn bounds(&self) -> Rect;

    /// The bounds immediately before the last change. Equal to
    /// [`bounds`](Collider::bounds) for a collider at rest, which is what
    /// the default returns.
    fn previous_bounds(&self) -> Rect {
        self.bounds()
    }

    /// Whether the collider is static world geometry.
    fn is_static(&self) -> bool;

    /// Whether the collider participates in collision detection.
    fn is_enabled(&self) -> bool;
}

/// Plain-value [`Collider`] implementor for registration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ColliderState {
    /// Current axis-aligned bounds.
    pub bounds: Rect,
    /// Classification and participation flags.
    pub flags: ColliderFlags,
}

impl ColliderState {
    /// A kinetic, enabled collider with the given bounds.
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            flags: ColliderFlags::default(),
        }
    }

    /// A static, enabled collider with the given bounds.
    pub fn new_static(bounds: Rect) -> Self {
        Self {
            bounds,
            flags: ColliderFlags::ENABLED | ColliderFlags::STATIC,
        }
    }
}

impl Collider for ColliderState {
    fn bounds(&self) -> Rect {
        self.bounds
    }

    fn is_static(&self) -> bool {
        self.flags.contains(ColliderFlags::STATIC)
    }

    fn is_enabled(&self) -> bool {
        self.flags.contains(ColliderFlags::ENABLED)
    }
}

/// An unordered pair of colliding colliders.
///
/// Construction normalizes the operands so that `a <= b`; pairs built from
/// the same two ids in either order compare equal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollisionPair {
    a: ColliderId,
    b: ColliderId,
}

impl CollisionPair {
    /// Build a normalized pair from two ids in any order.
    pub fn new(x: ColliderId, y: ColliderId) -> Self {
        if x <= y { Self { a: x, b: y } } else { Self { a: y, b: x } }
    }

    /// The smaller id of the pair.
    pub fn a(self) -> ColliderId {
        self.a
    }

    /// The larger id of the pair.
    pub fn b(self) -> ColliderId {
        self.b
    }

    /// Whether `id` is one of the pair's members.
    pub fn involves(self, id: ColliderId) -> bool {
        self.a == id || self.b == id
    }

    /// The member opposite `id`, if `id` is a member.
    pub fn other(self, id: ColliderId) -> Option<ColliderId> {
        if self.a == id {
            Some(self.b)
        } else if self.b == id {
            Some(self.a)
        } else {
            None
        }
    }
}
