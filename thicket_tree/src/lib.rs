// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Tree: a Kurbo-native dynamic AABB tree for 2D broad-phase queries.
//!
//! Thicket Tree is a reusable building block for broad-phase collision
//! detection and spatial queries over moving boxes.
//!
//! - Insert and remove arbitrary items keyed by a small, ordered handle type.
//! - Leaves store *fattened* bounds: the item's true rectangle grown by a
//!   margin and extended in its direction of motion, so small moves do not
//!   restructure the tree. [`DynamicBoxTree::refresh`] reinserts a leaf only
//!   once its true rectangle has escaped the fattened one.
//! - Enumerate all leaf pairs with overlapping fattened bounds, within one
//!   tree ([`DynamicBoxTree::self_pairs`]) or across two trees
//!   ([`DynamicBoxTree::cross_pairs`]), without visiting all O(n²) pairs
//!   when the boxes are spatially dispersed.
//! - Query by rectangle or point.
//!
//! The tree does not own the items' geometry. It is constructed from two
//! accessor functions returning an item's current and previous rectangle, and
//! consults them when a leaf is (re)inserted. Higher layers decide what an
//! item is; this crate only sees `Copy + Ord` keys.
//!
//! Overlap uses **open-interval** semantics throughout: rectangles that merely
//! touch at an edge or corner do not overlap. See [`RectExt`].
//!
//! # Example
//!
//! ```rust
//! use kurbo::Rect;
//! use thicket_tree::DynamicBoxTree;
//!
//! // A tree over indices into a fixed set of boxes.
//! let boxes = vec![
//!     Rect::new(0.0, 0.0, 10.0, 10.0),
//!     Rect::new(5.0, 5.0, 15.0, 15.0),
//!     Rect::new(40.0, 40.0, 50.0, 50.0),
//! ];
//! let current = boxes.clone();
//! let previous = boxes;
//! let mut tree = DynamicBoxTree::new(
//!     move |i: usize| current[i],
//!     move |i: usize| previous[i],
//! );
//! for i in 0..3 {
//!     tree.add(i).unwrap();
//! }
//!
//! // Only the first two boxes overlap.
//! let mut pairs = Vec::new();
//! tree.self_pairs(&mut pairs);
//! assert_eq!(pairs.len(), 1);
//!
//! // Removing an item restores the tree to a state indistinguishable from
//! // one that never contained it.
//! tree.remove(1).unwrap();
//! pairs.clear();
//! tree.self_pairs(&mut pairs);
//! assert!(pairs.is_empty());
//! ```
//!
//! ### Float semantics
//!
//! This crate assumes finite, non-NaN coordinates. Debug builds may assert.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod error;
pub mod rect;
pub mod tree;

pub use error::TreeError;
pub use rect::RectExt;
pub use tree::{DEFAULT_MARGIN, DynamicBoxTree};
