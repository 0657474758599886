// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The collision engine: registration, dirty tracking, and the per-tick
//! update that publishes overlap pairs.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use kurbo::Rect;
use thicket_tree::{DynamicBoxTree, RectExt};

use crate::collider::{Collider, ColliderFlags, ColliderId, CollisionPair};
use crate::error::EngineError;

/// Engine-side state of one registered collider.
#[derive(Copy, Clone, Debug)]
struct Record {
    bounds: Rect,
    previous: Rect,
    flags: ColliderFlags,
    /// Which tree currently holds this collider's leaf. Lags behind the
    /// `STATIC` flag until the next update re-indexes the record.
    in_static_tree: bool,
    /// Set by every setter, cleared when the record is re-indexed.
    dirty: bool,
}

/// Slot arena for collider records. Generations persist across reuse so
/// stale [`ColliderId`]s never alias a live record.
#[derive(Debug, Default)]
struct Slots {
    records: Vec<Option<Record>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl Slots {
    fn allocate(&mut self, record: Record) -> ColliderId {
        if let Some(slot) = self.free_list.pop() {
            let i = slot as usize;
            self.generations[i] += 1;
            self.records[i] = Some(record);
            ColliderId::new(slot, self.generations[i])
        } else {
            self.records.push(Some(record));
            self.generations.push(1);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slot indices are intentionally 32-bit; the arena never grows past u32::MAX."
            )]
            let slot = (self.records.len() - 1) as u32;
            ColliderId::new(slot, 1)
        }
    }

    fn release(&mut self, id: ColliderId) {
        self.records[id.slot()] = None;
        self.free_list.push(id.0);
    }

    fn get(&self, id: ColliderId) -> Option<&Record> {
        if *self.generations.get(id.slot())? != id.1 {
            return None;
        }
        self.records[id.slot()].as_ref()
    }

    fn get_mut(&mut self, id: ColliderId) -> Option<&mut Record> {
        if *self.generations.get(id.slot())? != id.1 {
            return None;
        }
        self.records[id.slot()].as_mut()
    }

    /// Record for an id the engine itself vouches for (tree leaves, dirty
    /// lists). Stale ids here are a programming error.
    fn record(&self, id: ColliderId) -> &Record {
        self.get(id).expect("stale ColliderId")
    }

    fn live_ids(&self) -> impl Iterator<Item = ColliderId> + '_ {
        self.records.iter().enumerate().filter_map(|(i, r)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Slot indices are intentionally 32-bit; the arena never grows past u32::MAX."
            )]
            r.as_ref().map(|_| ColliderId::new(i as u32, self.generations[i]))
        })
    }
}

/// Broad-phase collision engine over two dynamic AABB trees.
///
/// Kinetic colliders live in one tree, static colliders in another, so the
/// potentially huge set of static-static pairs is never even enumerated.
/// Callers mutate collider state through the setters, which only flip a
/// dirty flag and record the previous bounds; all structural work happens
/// in [`update`](CollisionEngine::update), once per game tick:
///
/// 1. every dirty enabled record is re-indexed (its leaf refreshed in
///    place, or moved between trees when its static classification
///    changed);
/// 2. the trees enumerate candidate pairs (kinetic self-pairs plus
///    kinetic-static cross pairs) from fattened leaf boxes;
/// 3. candidates where both colliders are enabled and whose *true* bounds
///    overlap (open-interval) become the published snapshot, sorted and
///    deduplicated.
///
/// Disabled colliders keep their leaf and their dirty flag; they simply
/// produce no pairs until re-enabled.
#[derive(Debug)]
pub struct CollisionEngine {
    world: Rect,
    slots: Rc<RefCell<Slots>>,
    kinetic: DynamicBoxTree<ColliderId>,
    statics: DynamicBoxTree<ColliderId>,
    candidates: Vec<(ColliderId, ColliderId)>,
    pairs: Vec<CollisionPair>,
}

impl CollisionEngine {
    /// Create an engine for a world of the given extent.
    ///
    /// The extent is advisory: debug builds assert that registered
    /// colliders lie within it, release builds ignore it.
    pub fn new(world: Rect) -> Self {
        let slots = Rc::new(RefCell::new(Slots::default()));
        let kinetic = Self::tree_over(&slots);
        let statics = Self::tree_over(&slots);
        Self {
            world,
            slots,
            kinetic,
            statics,
            candidates: Vec::new(),
            pairs: Vec::new(),
        }
    }

    /// A tree whose accessors read live records out of the shared arena.
    fn tree_over(slots: &Rc<RefCell<Slots>>) -> DynamicBoxTree<ColliderId> {
        let cur = Rc::clone(slots);
        let prev = Rc::clone(slots);
        DynamicBoxTree::new(
            move |id| cur.borrow().record(id).bounds,
            move |id| prev.borrow().record(id).previous,
        )
    }

    /// Register a collider, snapshotting its state.
    ///
    /// Returns a fresh [`ColliderId`]; fails with
    /// [`EngineError::NonFiniteBounds`] if either bounds rectangle has a
    /// NaN or infinite coordinate.
    pub fn insert(&mut self, collider: &impl Collider) -> Result<ColliderId, EngineError> {
        let bounds = collider.bounds();
        let previous = collider.previous_bounds();
        if !bounds.is_finite() || !previous.is_finite() {
            return Err(EngineError::NonFiniteBounds);
        }
        debug_assert!(
            self.world.contains_rect(bounds),
            "collider registered outside the world extent"
        );
        let is_static = collider.is_static();
        let mut flags = ColliderFlags::empty();
        flags.set(ColliderFlags::STATIC, is_static);
        flags.set(ColliderFlags::ENABLED, collider.is_enabled());
        let id = self.slots.borrow_mut().allocate(Record {
            bounds,
            previous,
            flags,
            in_static_tree: is_static,
            dirty: false,
        });
        let tree = if is_static {
            &mut self.statics
        } else {
            &mut self.kinetic
        };
        tree.add(id).expect("fresh id already present in a tree");
        Ok(id)
    }

    /// Remove a collider and free its slot.
    ///
    /// Its id and every id equal to it become stale immediately; the pair
    /// snapshot still holds until the next [`update`](Self::update).
    pub fn remove(&mut self, id: ColliderId) -> Result<(), EngineError> {
        let in_static = {
            let slots = self.slots.borrow();
            slots.get(id).ok_or(EngineError::UnknownCollider)?.in_static_tree
        };
        let tree = if in_static {
            &mut self.statics
        } else {
            &mut self.kinetic
        };
        tree.remove(id).expect("live collider missing from its tree");
        self.slots.borrow_mut().release(id);
        Ok(())
    }

    /// Move a collider: the old bounds become its previous bounds and the
    /// record is marked dirty for the next update.
    pub fn set_bounds(&mut self, id: ColliderId, bounds: Rect) -> Result<(), EngineError> {
        if !bounds.is_finite() {
            return Err(EngineError::NonFiniteBounds);
        }
        let mut slots = self.slots.borrow_mut();
        let r = slots.get_mut(id).ok_or(EngineError::UnknownCollider)?;
        r.previous = r.bounds;
        r.bounds = bounds;
        r.dirty = true;
        Ok(())
    }

    /// Change a collider's static classification. The leaf moves between
    /// trees at the next update.
    pub fn set_static(&mut self, id: ColliderId, value: bool) -> Result<(), EngineError> {
        let mut slots = self.slots.borrow_mut();
        let r = slots.get_mut(id).ok_or(EngineError::UnknownCollider)?;
        if r.flags.contains(ColliderFlags::STATIC) != value {
            r.flags.set(ColliderFlags::STATIC, value);
            r.dirty = true;
        }
        Ok(())
    }

    /// Enable or disable a collider. Disabled colliders stay registered
    /// and keep their leaf, but produce no pairs.
    pub fn set_enabled(&mut self, id: ColliderId, value: bool) -> Result<(), EngineError> {
        let mut slots = self.slots.borrow_mut();
        let r = slots.get_mut(id).ok_or(EngineError::UnknownCollider)?;
        if r.flags.contains(ColliderFlags::ENABLED) != value {
            r.flags.set(ColliderFlags::ENABLED, value);
            r.dirty = true;
        }
        Ok(())
    }

    /// Current bounds of a live collider.
    pub fn bounds(&self, id: ColliderId) -> Option<Rect> {
        self.slots.borrow().get(id).map(|r| r.bounds)
    }

    /// Bounds before the last change of a live collider.
    pub fn previous_bounds(&self, id: ColliderId) -> Option<Rect> {
        self.slots.borrow().get(id).map(|r| r.previous)
    }

    /// Whether a live collider is static.
    pub fn is_static(&self, id: ColliderId) -> Option<bool> {
        self.slots
            .borrow()
            .get(id)
            .map(|r| r.flags.contains(ColliderFlags::STATIC))
    }

    /// Whether a live collider is enabled.
    pub fn is_enabled(&self, id: ColliderId) -> Option<bool> {
        self.slots
            .borrow()
            .get(id)
            .map(|r| r.flags.contains(ColliderFlags::ENABLED))
    }

    /// Whether `id` refers to a live collider.
    pub fn is_alive(&self, id: ColliderId) -> bool {
        self.slots.borrow().get(id).is_some()
    }

    /// Number of registered colliders, disabled ones included.
    pub fn len(&self) -> usize {
        self.kinetic.len() + self.statics.len()
    }

    /// True if no colliders are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The advisory world extent passed to [`new`](Self::new).
    pub fn world(&self) -> Rect {
        self.world
    }

    /// Run one collision tick: re-index dirty colliders, enumerate
    /// candidates from the trees, and publish the exact overlap pairs.
    ///
    /// The previous snapshot is replaced wholesale.
    pub fn update(&mut self) {
        self.reindex_dirty();

        self.candidates.clear();
        self.kinetic.self_pairs(&mut self.candidates);
        self.kinetic.cross_pairs(&self.statics, &mut self.candidates);

        self.pairs.clear();
        {
            let slots = self.slots.borrow();
            for &(x, y) in &self.candidates {
                let rx = slots.record(x);
                let ry = slots.record(y);
                if !rx.flags.contains(ColliderFlags::ENABLED)
                    || !ry.flags.contains(ColliderFlags::ENABLED)
                {
                    continue;
                }
                // Exact test on true bounds; the trees only saw fattened ones.
                if rx.bounds.overlaps_open(ry.bounds) {
                    self.pairs.push(CollisionPair::new(x, y));
                }
            }
        }
        self.pairs.sort_unstable();
        self.pairs.dedup();
    }

    /// The pairs published by the last [`update`](Self::update), sorted and
    /// free of duplicates. Valid until the next update.
    pub fn collisions(&self) -> &[CollisionPair] {
        &self.pairs
    }

    /// The colliders paired with `id` in the last snapshot.
    pub fn collisions_with(&self, id: ColliderId) -> impl Iterator<Item = ColliderId> + '_ {
        self.pairs.iter().filter_map(move |p| p.other(id))
    }

    /// Bring tree leaves back in line with dirty records. Disabled records
    /// keep their dirty flag so re-enabling re-indexes them here.
    fn reindex_dirty(&mut self) {
        let dirty: Vec<ColliderId> = {
            let slots = self.slots.borrow();
            slots
                .live_ids()
                .filter(|&id| {
                    let r = slots.record(id);
                    r.dirty && r.flags.contains(ColliderFlags::ENABLED)
                })
                .collect()
        };
        for id in dirty {
            // Accessor closures borrow the arena, so no RefCell borrow may
            // be held across the tree calls below.
            let (was_static, now_static) = {
                let mut slots = self.slots.borrow_mut();
                let r = slots.get_mut(id).expect("dirty collider vanished");
                r.dirty = false;
                let was = r.in_static_tree;
                let now = r.flags.contains(ColliderFlags::STATIC);
                r.in_static_tree = now;
                (was, now)
            };
            if was_static == now_static {
                let tree = if now_static {
                    &mut self.statics
                } else {
                    &mut self.kinetic
                };
                tree.refresh(id).expect("live collider missing from its tree");
            } else {
                let (from, to) = if now_static {
                    (&mut self.kinetic, &mut self.statics)
                } else {
                    (&mut self.statics, &mut self.kinetic)
                };
                from.remove(id).expect("live collider missing from its tree");
                to.add(id).expect("collider already present in destination tree");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collider::ColliderState;

    const WORLD: Rect = Rect::new(0.0, 0.0, 1000.0, 1000.0);

    fn engine() -> CollisionEngine {
        CollisionEngine::new(WORLD)
    }

    fn kinetic(e: &mut CollisionEngine, r: Rect) -> ColliderId {
        e.insert(&ColliderState::new(r)).unwrap()
    }

    fn fixed(e: &mut CollisionEngine, r: Rect) -> ColliderId {
        e.insert(&ColliderState::new_static(r)).unwrap()
    }

    #[test]
    fn overlapping_kinetic_pair_is_reported() {
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = kinetic(&mut e, Rect::new(5.0, 5.0, 15.0, 15.0));
        let far = kinetic(&mut e, Rect::new(500.0, 500.0, 510.0, 510.0));

        e.update();
        assert_eq!(e.collisions(), &[CollisionPair::new(a, b)]);
        assert!(e.collisions_with(far).next().is_none());
    }

    #[test]
    fn touching_edges_do_not_collide() {
        let mut e = engine();
        kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        kinetic(&mut e, Rect::new(10.0, 0.0, 20.0, 10.0)); // shared edge
        kinetic(&mut e, Rect::new(10.0, 10.0, 20.0, 20.0)); // shared corner

        e.update();
        assert!(e.collisions().is_empty());
    }

    #[test]
    fn static_pairs_are_never_reported() {
        let mut e = engine();
        let s1 = fixed(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let s2 = fixed(&mut e, Rect::new(5.0, 5.0, 15.0, 15.0));
        let k = kinetic(&mut e, Rect::new(8.0, 8.0, 12.0, 12.0));

        e.update();
        let pairs = e.collisions();
        assert!(pairs.contains(&CollisionPair::new(k, s1)));
        assert!(pairs.contains(&CollisionPair::new(k, s2)));
        assert!(!pairs.contains(&CollisionPair::new(s1, s2)));
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn movement_creates_and_clears_pairs() {
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let wall = fixed(&mut e, Rect::new(100.0, 0.0, 110.0, 10.0));

        e.update();
        assert!(e.collisions().is_empty());

        e.set_bounds(a, Rect::new(95.0, 0.0, 105.0, 10.0)).unwrap();
        e.update();
        assert_eq!(e.collisions(), &[CollisionPair::new(a, wall)]);

        e.set_bounds(a, Rect::new(200.0, 0.0, 210.0, 10.0)).unwrap();
        e.update();
        assert!(e.collisions().is_empty());
    }

    #[test]
    fn small_moves_are_still_exact() {
        // Fattened leaves overlap long before true bounds do; the narrow
        // phase must not leak those false positives.
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = kinetic(&mut e, Rect::new(10.05, 0.0, 20.0, 10.0));

        e.update();
        assert!(e.collisions().is_empty(), "close but not overlapping");

        e.set_bounds(a, Rect::new(0.1, 0.0, 10.1, 10.0)).unwrap();
        e.update();
        assert_eq!(e.collisions(), &[CollisionPair::new(a, b)]);
    }

    #[test]
    fn disabled_colliders_produce_no_pairs() {
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = kinetic(&mut e, Rect::new(5.0, 5.0, 15.0, 15.0));

        e.update();
        assert_eq!(e.collisions().len(), 1);

        e.set_enabled(a, false).unwrap();
        e.update();
        assert!(e.collisions().is_empty());
        assert!(e.is_alive(a), "disabled is not removed");
        assert_eq!(e.len(), 2);

        e.set_enabled(a, true).unwrap();
        e.update();
        assert_eq!(e.collisions(), &[CollisionPair::new(a, b)]);
    }

    #[test]
    fn moves_while_disabled_apply_on_reenable() {
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = kinetic(&mut e, Rect::new(5.0, 5.0, 15.0, 15.0));
        let c = kinetic(&mut e, Rect::new(500.0, 500.0, 510.0, 510.0));

        e.set_enabled(a, false).unwrap();
        e.update();
        assert!(e.collisions().is_empty());

        // Teleport while disabled; the leaf goes stale but the dirty flag
        // survives until the collider participates again.
        e.set_bounds(a, Rect::new(505.0, 505.0, 515.0, 515.0)).unwrap();
        e.update();
        assert!(e.collisions().is_empty());

        e.set_enabled(a, true).unwrap();
        e.update();
        assert_eq!(e.collisions(), &[CollisionPair::new(a, c)]);
        assert!(e.collisions_with(b).next().is_none());
    }

    #[test]
    fn static_toggle_moves_between_trees() {
        let mut e = engine();
        let s1 = fixed(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let s2 = fixed(&mut e, Rect::new(5.0, 5.0, 15.0, 15.0));

        e.update();
        assert!(e.collisions().is_empty(), "two statics never pair");

        e.set_static(s1, false).unwrap();
        e.update();
        assert_eq!(e.collisions(), &[CollisionPair::new(s1, s2)]);
        assert_eq!(e.is_static(s1), Some(false));

        e.set_static(s1, true).unwrap();
        e.update();
        assert!(e.collisions().is_empty());
    }

    #[test]
    fn moved_static_is_reindexed() {
        let mut e = engine();
        let s = fixed(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let k = kinetic(&mut e, Rect::new(300.0, 300.0, 310.0, 310.0));

        e.update();
        assert!(e.collisions().is_empty());

        // Statics rarely move, but when one does the dirty poll picks it up
        // like any other collider.
        e.set_bounds(s, Rect::new(305.0, 305.0, 315.0, 315.0)).unwrap();
        e.update();
        assert_eq!(e.collisions(), &[CollisionPair::new(s, k)]);
    }

    #[test]
    fn stale_ids_are_rejected_everywhere() {
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        e.remove(a).unwrap();

        assert!(!e.is_alive(a));
        assert_eq!(e.bounds(a), None);
        assert_eq!(e.previous_bounds(a), None);
        assert_eq!(e.is_static(a), None);
        assert_eq!(e.is_enabled(a), None);
        assert_eq!(e.remove(a), Err(EngineError::UnknownCollider));
        assert_eq!(
            e.set_bounds(a, Rect::new(0.0, 0.0, 1.0, 1.0)),
            Err(EngineError::UnknownCollider)
        );
        assert_eq!(e.set_static(a, true), Err(EngineError::UnknownCollider));
        assert_eq!(e.set_enabled(a, false), Err(EngineError::UnknownCollider));
    }

    #[test]
    fn slot_reuse_never_aliases() {
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        e.remove(a).unwrap();
        let b = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));

        assert_ne!(a, b);
        assert_eq!(a.slot(), b.slot(), "slot is reused");
        assert!(!e.is_alive(a), "old id stays stale after reuse");
        assert!(e.is_alive(b));
    }

    #[test]
    fn non_finite_bounds_are_rejected() {
        let mut e = engine();
        assert_eq!(
            e.insert(&ColliderState::new(Rect::new(f64::NAN, 0.0, 1.0, 1.0))),
            Err(EngineError::NonFiniteBounds)
        );
        assert!(e.is_empty());

        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            e.set_bounds(a, Rect::new(0.0, 0.0, f64::INFINITY, 1.0)),
            Err(EngineError::NonFiniteBounds)
        );
        // The failed set must not have touched the record.
        assert_eq!(e.bounds(a), Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
        e.update();
        assert!(e.collisions().is_empty());
    }

    #[test]
    fn collisions_with_filters_the_snapshot() {
        let mut e = engine();
        let hub = kinetic(&mut e, Rect::new(10.0, 10.0, 30.0, 30.0));
        let left = kinetic(&mut e, Rect::new(5.0, 15.0, 15.0, 25.0));
        let right = kinetic(&mut e, Rect::new(25.0, 15.0, 35.0, 25.0));

        e.update();
        let mut others: Vec<ColliderId> = e.collisions_with(hub).collect();
        others.sort_unstable();
        let mut expected = alloc::vec![left, right];
        expected.sort_unstable();
        assert_eq!(others, expected);
        assert!(
            e.collisions_with(left).all(|o| o == hub),
            "left only touches the hub"
        );
    }

    #[test]
    fn snapshot_is_deterministic_and_replaced_wholesale() {
        let mut e = engine();
        let a = kinetic(&mut e, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = kinetic(&mut e, Rect::new(5.0, 5.0, 15.0, 15.0));

        e.update();
        let first = e.collisions().to_vec();
        e.update();
        assert_eq!(e.collisions(), &*first, "idle update changes nothing");

        e.remove(a).unwrap();
        e.update();
        assert!(e.collisions().is_empty(), "old pairs do not linger");
        assert!(e.is_alive(b));
    }

    #[test]
    fn snapshot_matches_brute_force_on_a_mixed_scene() {
        let mut e = engine();
        let mut all = Vec::new();

        // A loose grid of kinetic boxes, some statics woven through, a few
        // disabled. Sized so neighbors overlap horizontally.
        for i in 0..6 {
            for j in 0..6 {
                let x = f64::from(i) * 12.0;
                let y = f64::from(j) * 20.0;
                let r = Rect::new(x, y, x + 15.0, y + 15.0);
                let id = if (i + j) % 3 == 0 {
                    fixed(&mut e, r)
                } else {
                    kinetic(&mut e, r)
                };
                if (i + j) % 5 == 4 {
                    e.set_enabled(id, false).unwrap();
                }
                all.push(id);
            }
        }
        e.update();

        let mut expected = Vec::new();
        for (i, &x) in all.iter().enumerate() {
            for &y in &all[i + 1..] {
                if e.is_enabled(x) != Some(true) || e.is_enabled(y) != Some(true) {
                    continue;
                }
                if e.is_static(x) == Some(true) && e.is_static(y) == Some(true) {
                    continue;
                }
                let (rx, ry) = (e.bounds(x).unwrap(), e.bounds(y).unwrap());
                if rx.overlaps_open(ry) {
                    expected.push(CollisionPair::new(x, y));
                }
            }
        }
        expected.sort_unstable();
        assert_eq!(e.collisions(), &*expected);
    }
}
