// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for tree mutations.

/// Errors returned by [`DynamicBoxTree`](crate::DynamicBoxTree) mutations.
///
/// All variants are deterministic logic errors. A failed `add` or `remove`
/// leaves the tree unchanged; nothing here is transient or retryable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The item is already present. Duplicate insertion is never treated as
    /// an update; remove and re-add to relocate an item.
    #[error("item is already present in the tree")]
    DuplicateItem,
    /// The item is not present. A remove of an absent item usually indicates
    /// bookkeeping desynchronization in the caller.
    #[error("item is not present in the tree")]
    NotFound,
}
