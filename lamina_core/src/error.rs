// Copyright 2026 the Lamina Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.

use alloc::string::String;

use crate::entity::EntityId;
use crate::output::ElementId;

/// Errors raised while committing or flushing a frame.
///
/// None of these are recovered internally: a failing step returns the error
/// to the host, which decides whether to keep driving frames.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// A context already owns a permanent allocator.
    #[error("context already has an allocator bound")]
    AllocatorAlreadyBound,
    /// A floating context was updated without an allocator.
    #[error("context has no allocator; bind one or pass a floating allocator to update")]
    MissingAllocator,
    /// An entity was reached while it was already being committed or
    /// expanded, e.g. a composite whose spec contains itself.
    #[error("entity {0:?} re-entered during commit")]
    ReentrantEntity(EntityId),
    /// Applying buffered output failed.
    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Errors raised by an [`OutputTree`](crate::output::OutputTree) while
/// applying operations.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    /// The operation referenced an element id the tree never saw created or
    /// mounted.
    #[error("unknown output element {0:?}")]
    UnknownElement(ElementId),
    /// The native tree rejected the mutation.
    #[error("output backend error: {0}")]
    Backend(String),
}
