// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine error types.

use thiserror::Error;

/// Errors reported by [`CollisionEngine`](crate::CollisionEngine) operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The id does not refer to a live collider. It was either never issued
    /// by this engine or its collider has been removed.
    #[error("collider id is stale or unknown")]
    UnknownCollider,
    /// The supplied bounds contain a NaN or infinite coordinate.
    #[error("collider bounds must be finite")]
    NonFiniteBounds,
}
