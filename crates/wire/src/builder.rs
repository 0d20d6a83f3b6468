// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The framing state machine contract.

use thiserror::Error;

use crate::unit::Unit;

/// Framing violations. The connection that produced the bytes is disconnected;
/// the server or client continues.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    #[error("declared payload length {length} exceeds the {max} byte maximum")]
    Overlength { length: usize, max: usize },

    #[error("payload of {actual} bytes does not fit the fixed unit size {size}")]
    FixedSizeMismatch { actual: usize, size: usize },

    #[error("integer unit requires exactly {expected} bytes, got {actual}")]
    IntegerWidth { expected: usize, actual: usize },

    #[error("payload contains the delimiter sequence")]
    DelimiterInPayload,
}

/// Incremental byte-stream-to-unit framing.
///
/// `feed` inspects a prefix of `input` and returns how many bytes it claims.
/// A builder claims bytes only when they complete a unit, so unclaimed bytes
/// always stay with the caller and no byte is ever lost. After a claim,
/// `unit_ready()` is true and `take_unit()` yields the parsed unit;
/// `reset()` prepares the builder for the next one.
///
/// `create` builds the outgoing form: a unit whose
/// [`to_network_string`](Unit::to_network_string) a fresh builder of the same
/// kind parses back into an equal unit.
///
/// Builders are plain data and are shared as protocol templates across
/// accept-handler threads, hence `Send + Sync`.
pub trait UnitBuilder: Send + Sync {
    /// Consume a prefix of `input`; returns the number of bytes claimed.
    fn feed(&mut self, input: &[u8]) -> Result<usize, FramingError>;

    /// Whether a complete unit is waiting to be taken.
    fn unit_ready(&self) -> bool;

    /// The parsed unit, if one is ready.
    fn take_unit(&mut self) -> Option<Unit>;

    /// Clear any parsed unit and partial state.
    fn reset(&mut self);

    /// Construct the outgoing unit for `payload`.
    fn create(&self, payload: &[u8]) -> Result<Unit, FramingError>;

    /// Clone into a fresh boxed builder (protocol templates are cloned per
    /// connection).
    fn clone_box(&self) -> Box<dyn UnitBuilder>;
}

impl Clone for Box<dyn UnitBuilder> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
