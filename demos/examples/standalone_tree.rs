// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Using the dynamic AABB tree directly, without the engine.
//!
//! The tree is generic over any `Copy + Ord` item; here the items are
//! indices into a caller-owned list of rectangles.
//!
//! Run:
//! - `cargo run -p thicket_demos --example standalone_tree`

use std::cell::RefCell;
use std::rc::Rc;

use kurbo::{Point, Rect};
use thicket_tree::DynamicBoxTree;

fn main() {
    let rects = Rc::new(RefCell::new(vec![
        Rect::new(0.0, 0.0, 50.0, 50.0),
        Rect::new(40.0, 40.0, 90.0, 90.0),
        Rect::new(200.0, 0.0, 250.0, 50.0),
        Rect::new(210.0, 10.0, 240.0, 40.0),
    ]));

    // Items at rest: previous bounds equal current bounds.
    // A generous margin so dragged items reinsert rarely.
    let cur = Rc::clone(&rects);
    let prev = Rc::clone(&rects);
    let mut tree = DynamicBoxTree::with_margin(
        4.0,
        move |i: usize| cur.borrow()[i],
        move |i: usize| prev.borrow()[i],
    );
    for i in 0..rects.borrow().len() {
        tree.add(i).unwrap();
    }

    let mut pairs = Vec::new();
    tree.self_pairs(&mut pairs);
    println!("overlapping pairs: {pairs:?}");

    let hits = tree.query_point(Point::new(45.0, 45.0));
    println!("rects over (45, 45): {hits:?}");

    // Drag rect 0 across the scene; the tree only reinserts its leaf when
    // the true bounds escape the fattened box.
    let mut reinsertions = 0;
    for _ in 0..30 {
        {
            let mut r = rects.borrow_mut();
            let old = r[0];
            r[0] = Rect::new(old.x0 + 1.0, old.y0, old.x1 + 1.0, old.y1);
        }
        if tree.refresh(0).unwrap() {
            reinsertions += 1;
        }
    }
    println!("30 drag steps, {reinsertions} reinsertions");

    let mut pairs = Vec::new();
    tree.self_pairs(&mut pairs);
    println!("pairs after the drag: {pairs:?}");
}
