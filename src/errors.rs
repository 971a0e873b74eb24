// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for kubedns.
//!
//! This module provides specialized error types for:
//! - Indexed store operations (wrong object type handed to a store)
//! - Controller lifecycle (shutdown, watch stream failures)
//! - Query resolution (no items, unparseable names, internal failures)
//! - The DNS handler boundary (encoding and writing responses)
//!
//! Only [`ResolveError`] crosses into the DNS response path: its classifiers
//! decide between NXDOMAIN and SERVFAIL. Controller errors stay internal.

use thiserror::Error;

/// Errors raised by an indexed store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// An object of a different kind was handed to a store.
    ///
    /// Returned when a tagged [`crate::object::Object`] is applied to a store that
    /// holds another kind. The object is otherwise ignored.
    #[error("obj was not of the correct type")]
    WrongType {
        /// The kind the store holds
        expected: &'static str,
        /// The kind that was supplied
        found: &'static str,
    },
}

/// Errors raised by the cluster-state controller.
#[derive(Error, Debug, Clone)]
pub enum ControllerError {
    /// `stop()` was invoked after a shutdown had already been requested.
    #[error("shutdown already in progress")]
    ShutdownInProgress,

    /// A watch stream for a kind reported an error.
    ///
    /// These are retried by the list/watch backoff and never surface to DNS clients.
    #[error("watch for {kind} failed: {reason}")]
    Watch {
        /// The kind whose stream failed
        kind: &'static str,
        /// Error reported by the stream
        reason: String,
    },

    /// A store rejected an object.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ControllerError {
    /// Returns true if this error is transient and handled by the watch backoff.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Watch { .. })
    }
}

/// Errors produced while resolving a query against the cluster indexes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No data matches a well-formed query.
    #[error("no items found")]
    NoItems,

    /// The query name does not fit the cluster schema.
    #[error("invalid query name")]
    ParseError,

    /// The queried name is outside every configured zone.
    #[error("name {0} is not in any configured zone")]
    NotAuthoritative(String),
}

impl ResolveError {
    /// Returns true if this error should be answered with NXDOMAIN.
    #[must_use]
    pub fn is_name_error(&self) -> bool {
        matches!(self, Self::NoItems | Self::ParseError)
    }

    /// Returns the metadata value published for this error, if any.
    #[must_use]
    pub fn metadata_value(&self) -> Option<&'static str> {
        match self {
            Self::ParseError => Some("invalid query name"),
            _ => None,
        }
    }
}

/// Errors returned from the handler entry point.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The request carried no question.
    #[error("request has no question")]
    NoQuestion,

    /// Resolution failed with a non-name error.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// DNS wire-format error while building the response.
    #[error("DNS protocol error: {0}")]
    Proto(#[from] hickory_proto::error::ProtoError),
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
