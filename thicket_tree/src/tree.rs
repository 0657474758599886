// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core tree implementation: arena, insertion heuristic, pair traversal.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use kurbo::{Point, Rect};

use crate::error::TreeError;
use crate::rect::RectExt;

/// Default fattening margin, in world units, applied on every side of a
/// leaf's true rectangle.
pub const DEFAULT_MARGIN: f64 = 0.1;

/// How far a leaf's fattened box is extended in the direction of the item's
/// last displacement, as a multiple of that displacement.
const MOTION_MULTIPLIER: f64 = 2.0;

/// Arena index of a node. Weak back-references (`parent`) reuse this type;
/// the arena itself is the sole owner of node storage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
struct NodeIndex(u32);

impl NodeIndex {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Node indices are intentionally 32-bit; the arena never grows past u32::MAX."
    )]
    const fn new(i: usize) -> Self {
        Self(i as u32)
    }

    const fn get(self) -> usize {
        self.0 as usize
    }
}

enum Kind<T> {
    Leaf(T),
    Internal { left: NodeIndex, right: NodeIndex },
}

struct Node<T> {
    /// Fattened bounds for leaves; exact union of both children for
    /// internal nodes.
    fat: Rect,
    parent: Option<NodeIndex>,
    /// 0 for leaves. Pair traversal descends the taller side.
    height: u32,
    kind: Kind<T>,
}

/// A dynamic AABB tree over items of type `T`.
///
/// The tree holds no geometry of its own. It is configured with two accessor
/// functions returning an item's authoritative *current* and *previous*
/// rectangle, and consults them whenever a leaf is inserted or refreshed.
/// Each leaf stores a fattened copy of the current rectangle (grown by the
/// margin and extended toward the item's motion), so minor movement leaves
/// the structure untouched.
///
/// Invariants, maintained by every mutation:
///
/// - an internal node's box equals the union of its two children's boxes;
/// - a leaf's fattened box contains its item's true current rectangle at the
///   time it was (re)inserted.
///
/// Violations are programming errors; [`DynamicBoxTree::validate`] walks the
/// whole tree and panics on the first inconsistency.
///
/// Mutation must be externally serialized; all mutating operations take
/// `&mut self` and the tree performs no internal synchronization.
pub struct DynamicBoxTree<T> {
    current_of: Box<dyn Fn(T) -> Rect>,
    previous_of: Box<dyn Fn(T) -> Rect>,
    nodes: Vec<Option<Node<T>>>,
    free_list: Vec<usize>,
    root: Option<NodeIndex>,
    leaves: BTreeMap<T, NodeIndex>,
    margin: f64,
}

impl<T> core::fmt::Debug for DynamicBoxTree<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("DynamicBoxTree")
            .field("leaves", &self.leaves.len())
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("margin", &self.margin)
            .field("has_root", &self.root.is_some())
            .finish_non_exhaustive()
    }
}

impl<T: Copy + Ord> DynamicBoxTree<T> {
    /// Create an empty tree with the default margin.
    ///
    /// `current_of` must return the item's authoritative current rectangle;
    /// `previous_of` the rectangle immediately before the last change (equal
    /// to the current one for an item at rest). Both are consulted only
    /// during [`DynamicBoxTree::add`] and [`DynamicBoxTree::refresh`].
    pub fn new(
        current_of: impl Fn(T) -> Rect + 'static,
        previous_of: impl Fn(T) -> Rect + 'static,
    ) -> Self {
        Self::with_margin(DEFAULT_MARGIN, current_of, previous_of)
    }

    /// Create an empty tree with an explicit fattening margin.
    pub fn with_margin(
        margin: f64,
        current_of: impl Fn(T) -> Rect + 'static,
        previous_of: impl Fn(T) -> Rect + 'static,
    ) -> Self {
        Self {
            current_of: Box::new(current_of),
            previous_of: Box::new(previous_of),
            nodes: Vec::new(),
            free_list: Vec::new(),
            root: None,
            leaves: BTreeMap::new(),
            margin,
        }
    }

    /// Number of items in the tree.
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// True if the tree holds no items.
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    /// True if `item` currently has a leaf in the tree.
    pub fn contains(&self, item: T) -> bool {
        self.leaves.contains_key(&item)
    }

    /// The fattened bounds stored for `item`, if present.
    pub fn fat_bounds(&self, item: T) -> Option<Rect> {
        self.leaves.get(&item).map(|&leaf| self.node(leaf).fat)
    }

    /// Insert `item` as a new leaf.
    ///
    /// The leaf's box is the item's current rectangle fattened by the margin
    /// and extended toward the displacement implied by `current − previous`.
    /// Fails with [`TreeError::DuplicateItem`] if the item is already
    /// present; duplicate insertion is never treated as an update.
    pub fn add(&mut self, item: T) -> Result<(), TreeError> {
        if self.leaves.contains_key(&item) {
            return Err(TreeError::DuplicateItem);
        }
        let fat = self.fattened(item);
        debug_assert!(fat.is_finite(), "non-finite item bounds");
        let leaf = self.alloc(Node {
            fat,
            parent: None,
            height: 0,
            kind: Kind::Leaf(item),
        });
        self.leaves.insert(item, leaf);
        self.insert_leaf(leaf);
        Ok(())
    }

    /// Remove `item`'s leaf.
    ///
    /// The leaf's parent collapses by splicing the sibling up one level, and
    /// ancestor boxes are re-unioned to the root. Fails with
    /// [`TreeError::NotFound`] if the item is absent.
    pub fn remove(&mut self, item: T) -> Result<(), TreeError> {
        let leaf = self.leaves.remove(&item).ok_or(TreeError::NotFound)?;
        self.detach_leaf(leaf);
        self.free(leaf);
        Ok(())
    }

    /// Reinsert `item` if its true current rectangle escaped the stored
    /// fattened box; do nothing otherwise.
    ///
    /// Returns whether a reinsertion happened. Reinsertion, not in-place
    /// mutation, is how large moves are handled.
    pub fn refresh(&mut self, item: T) -> Result<bool, TreeError> {
        let leaf = *self.leaves.get(&item).ok_or(TreeError::NotFound)?;
        let current = (self.current_of)(item);
        if self.node(leaf).fat.contains_rect(current) {
            return Ok(false);
        }
        self.detach_leaf(leaf);
        let fat = self.fattened(item);
        {
            let n = self.node_mut(leaf);
            n.fat = fat;
            n.parent = None;
            n.height = 0;
        }
        self.insert_leaf(leaf);
        Ok(true)
    }

    /// Push every unordered pair of items whose fattened boxes overlap
    /// (open-interval) onto `out`, each pair exactly once.
    ///
    /// These are broad-phase candidates: callers still apply their exact
    /// test on true geometry downstream.
    pub fn self_pairs(&self, out: &mut Vec<(T, T)>) {
        if let Some(root) = self.root {
            self.pairs_within(root, out);
        }
    }

    /// Push every pair `(a, b)` with `a` from `self` and `b` from `other`
    /// whose fattened boxes overlap onto `out`.
    pub fn cross_pairs(&self, other: &Self, out: &mut Vec<(T, T)>) {
        if let (Some(ra), Some(rb)) = (self.root, other.root) {
            self.cross_between(ra, other, rb, out);
        }
    }

    /// Items whose fattened boxes overlap `rect` (open-interval).
    ///
    /// Like pair enumeration this is conservative: hits are candidates whose
    /// true rectangles may still miss `rect`.
    pub fn query_rect(&self, rect: Rect) -> Vec<T> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let n = self.node(idx);
            if !n.fat.overlaps_open(rect) {
                continue;
            }
            match n.kind {
                Kind::Leaf(item) => out.push(item),
                Kind::Internal { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        out
    }

    /// Items whose fattened boxes contain `p` (boundary-inclusive).
    pub fn query_point(&self, p: Point) -> Vec<T> {
        let mut out = Vec::new();
        let Some(root) = self.root else {
            return out;
        };
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let n = self.node(idx);
            if !n.fat.contains_point_inclusive(p) {
                continue;
            }
            match n.kind {
                Kind::Leaf(item) => out.push(item),
                Kind::Internal { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        out
    }

    /// Walk the whole tree and panic on the first structural inconsistency.
    ///
    /// Checks the union invariant, fattened-box containment, parent
    /// back-references, heights, and agreement between the leaf map and the
    /// reachable leaves. Intended for tests and debug builds; cost is O(n).
    pub fn validate(&self) {
        let mut reached = 0_usize;
        if let Some(root) = self.root {
            assert!(
                self.node(root).parent.is_none(),
                "root must have no parent"
            );
            reached = self.validate_node(root);
        }
        assert_eq!(
            reached,
            self.leaves.len(),
            "leaf map out of sync with reachable leaves"
        );
    }

    // --- internals ---

    fn fattened(&self, item: T) -> Rect {
        let current = (self.current_of)(item);
        let previous = (self.previous_of)(item);
        let displacement = (current.origin() - previous.origin()) * MOTION_MULTIPLIER;
        current
            .inflate(self.margin, self.margin)
            .extended_by(displacement)
    }

    fn node(&self, idx: NodeIndex) -> &Node<T> {
        self.nodes[idx.get()].as_ref().expect("dangling NodeIndex")
    }

    fn node_mut(&mut self, idx: NodeIndex) -> &mut Node<T> {
        self.nodes[idx.get()].as_mut().expect("dangling NodeIndex")
    }

    fn alloc(&mut self, node: Node<T>) -> NodeIndex {
        if let Some(i) = self.free_list.pop() {
            self.nodes[i] = Some(node);
            NodeIndex::new(i)
        } else {
            self.nodes.push(Some(node));
            NodeIndex::new(self.nodes.len() - 1)
        }
    }

    fn free(&mut self, idx: NodeIndex) {
        self.nodes[idx.get()] = None;
        self.free_list.push(idx.get());
    }

    /// Attach an orphan leaf below the best sibling and refit upward.
    fn insert_leaf(&mut self, leaf: NodeIndex) {
        let Some(root) = self.root else {
            self.root = Some(leaf);
            return;
        };
        let fat = self.node(leaf).fat;
        let sibling = self.find_best_sibling(root, fat);

        let old_parent = self.node(sibling).parent;
        let parent_fat = fat.union(self.node(sibling).fat);
        let parent_height = self.node(sibling).height + 1;
        let parent = self.alloc(Node {
            fat: parent_fat,
            parent: old_parent,
            height: parent_height,
            kind: Kind::Internal {
                left: sibling,
                right: leaf,
            },
        });
        self.node_mut(sibling).parent = Some(parent);
        self.node_mut(leaf).parent = Some(parent);
        match old_parent {
            None => self.root = Some(parent),
            Some(gp) => self.replace_child(gp, sibling, parent),
        }
        self.refit_from(old_parent);
    }

    /// Detach a leaf, splicing its sibling into the grandparent. The leaf
    /// node itself stays allocated (callers either free or reinsert it).
    fn detach_leaf(&mut self, leaf: NodeIndex) {
        if Some(leaf) == self.root {
            self.root = None;
            return;
        }
        let parent = self
            .node(leaf)
            .parent
            .expect("non-root leaf without parent");
        let sibling = match self.node(parent).kind {
            Kind::Internal { left, right } => {
                if left == leaf {
                    right
                } else {
                    left
                }
            }
            Kind::Leaf(_) => unreachable!("a leaf cannot be a parent"),
        };
        let grandparent = self.node(parent).parent;
        self.node_mut(sibling).parent = grandparent;
        match grandparent {
            None => self.root = Some(sibling),
            Some(gp) => self.replace_child(gp, parent, sibling),
        }
        self.free(parent);
        self.refit_from(grandparent);
    }

    fn replace_child(&mut self, parent: NodeIndex, old: NodeIndex, new: NodeIndex) {
        match &mut self.node_mut(parent).kind {
            Kind::Internal { left, right } => {
                if *left == old {
                    *left = new;
                } else {
                    debug_assert_eq!(*right, old, "old child not found under parent");
                    *right = new;
                }
            }
            Kind::Leaf(_) => unreachable!("a leaf cannot be a parent"),
        }
    }

    /// Re-union boxes and recompute heights from `start` to the root.
    fn refit_from(&mut self, start: Option<NodeIndex>) {
        let mut current = start;
        while let Some(idx) = current {
            if let Kind::Internal { left, right } = self.node(idx).kind {
                let fat = self.node(left).fat.union(self.node(right).fat);
                let height = 1 + self.node(left).height.max(self.node(right).height);
                let n = self.node_mut(idx);
                n.fat = fat;
                n.height = height;
            }
            current = self.node(idx).parent;
        }
    }

    /// Branch-and-bound search for the sibling whose pairing with `fat`
    /// grows the tree least, by perimeter cost (the 2D surface-area
    /// heuristic). Descending into a subtree is pruned when even the
    /// lower bound on its cost cannot beat the best so far.
    fn find_best_sibling(&self, root: NodeIndex, fat: Rect) -> NodeIndex {
        let mut best = root;
        let mut best_cost = perimeter(fat.union(self.node(root).fat));

        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            let n = self.node(idx);
            let combined = perimeter(fat.union(n.fat));
            if combined < best_cost {
                best = idx;
                best_cost = combined;
            }
            if let Kind::Internal { left, right } = n.kind {
                // Cost inherited by everything below this node if we descend.
                let inherited = combined - perimeter(n.fat);
                let left_bound = perimeter(fat.union(self.node(left).fat)) + inherited;
                let right_bound = perimeter(fat.union(self.node(right).fat)) + inherited;
                if left_bound < best_cost || right_bound < best_cost {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        best
    }

    /// Enumerate overlapping leaf pairs fully inside the subtree at `idx`.
    fn pairs_within(&self, idx: NodeIndex, out: &mut Vec<(T, T)>) {
        if let Kind::Internal { left, right } = self.node(idx).kind {
            self.pairs_between(left, right, out);
            self.pairs_within(left, out);
            self.pairs_within(right, out);
        }
    }

    /// Enumerate overlapping leaf pairs with one side in each subtree.
    /// Disjoint boxes prune the entire product of the two subtrees.
    fn pairs_between(&self, a: NodeIndex, b: NodeIndex, out: &mut Vec<(T, T)>) {
        let na = self.node(a);
        let nb = self.node(b);
        if !na.fat.overlaps_open(nb.fat) {
            return;
        }
        match (&na.kind, &nb.kind) {
            (Kind::Leaf(x), Kind::Leaf(y)) => out.push((*x, *y)),
            (Kind::Leaf(_), Kind::Internal { left, right }) => {
                self.pairs_between(a, *left, out);
                self.pairs_between(a, *right, out);
            }
            (Kind::Internal { left, right }, Kind::Leaf(_)) => {
                self.pairs_between(*left, b, out);
                self.pairs_between(*right, b, out);
            }
            (
                Kind::Internal { left, right },
                Kind::Internal {
                    left: b_left,
                    right: b_right,
                },
            ) => {
                // Split the taller side so both recursions shrink.
                if na.height >= nb.height {
                    self.pairs_between(*left, b, out);
                    self.pairs_between(*right, b, out);
                } else {
                    self.pairs_between(a, *b_left, out);
                    self.pairs_between(a, *b_right, out);
                }
            }
        }
    }

    /// Like `pairs_between`, but `b` indexes into `other`'s arena.
    fn cross_between(&self, a: NodeIndex, other: &Self, b: NodeIndex, out: &mut Vec<(T, T)>) {
        let na = self.node(a);
        let nb = other.node(b);
        if !na.fat.overlaps_open(nb.fat) {
            return;
        }
        match (&na.kind, &nb.kind) {
            (Kind::Leaf(x), Kind::Leaf(y)) => out.push((*x, *y)),
            (Kind::Leaf(_), Kind::Internal { left, right }) => {
                self.cross_between(a, other, *left, out);
                self.cross_between(a, other, *right, out);
            }
            (Kind::Internal { left, right }, Kind::Leaf(_)) => {
                self.cross_between(*left, other, b, out);
                self.cross_between(*right, other, b, out);
            }
            (
                Kind::Internal { left, right },
                Kind::Internal {
                    left: b_left,
                    right: b_right,
                },
            ) => {
                if na.height >= nb.height {
                    self.cross_between(*left, other, b, out);
                    self.cross_between(*right, other, b, out);
                } else {
                    self.cross_between(a, other, *b_left, out);
                    self.cross_between(a, other, *b_right, out);
                }
            }
        }
    }

    fn validate_node(&self, idx: NodeIndex) -> usize {
        let n = self.node(idx);
        match &n.kind {
            Kind::Leaf(item) => {
                assert_eq!(
                    self.leaves.get(item),
                    Some(&idx),
                    "leaf map entry missing or pointing elsewhere"
                );
                assert!(
                    n.fat.contains_rect((self.current_of)(*item)),
                    "leaf fattened box no longer contains the item's true bounds"
                );
                assert_eq!(n.height, 0, "leaf height must be zero");
                1
            }
            Kind::Internal { left, right } => {
                assert_eq!(
                    self.node(*left).parent,
                    Some(idx),
                    "left child parent back-reference broken"
                );
                assert_eq!(
                    self.node(*right).parent,
                    Some(idx),
                    "right child parent back-reference broken"
                );
                let union = self.node(*left).fat.union(self.node(*right).fat);
                assert_eq!(
                    n.fat, union,
                    "internal box must equal the union of its children"
                );
                let height = 1 + self.node(*left).height.max(self.node(*right).height);
                assert_eq!(n.height, height, "stale subtree height");
                self.validate_node(*left) + self.validate_node(*right)
            }
        }
    }
}

fn perimeter(r: Rect) -> f64 {
    2.0 * (r.width() + r.height())
}
