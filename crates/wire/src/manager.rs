// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection framing driver: residual buffer, builder, ready queue.

use std::collections::VecDeque;

use crate::builder::{FramingError, UnitBuilder};
use crate::unit::Unit;

/// Drives one [`UnitBuilder`] over a connection's byte stream.
///
/// Invariant: at any point, the concatenation of every emitted unit's
/// `to_network_string()` plus the residual equals the concatenation of every
/// byte ever fed.
pub struct UnitBuilderManager {
    builder: Box<dyn UnitBuilder>,
    residual: Vec<u8>,
    ready: VecDeque<Unit>,
}

impl UnitBuilderManager {
    pub fn new(builder: Box<dyn UnitBuilder>) -> Self {
        Self { builder, residual: Vec::new(), ready: VecDeque::new() }
    }

    pub fn builder(&self) -> &dyn UnitBuilder {
        self.builder.as_ref()
    }

    pub fn set_builder(&mut self, builder: Box<dyn UnitBuilder>) {
        self.builder = builder;
    }

    /// Append received bytes and extract every completed unit.
    pub fn feed(&mut self, data: &[u8]) -> Result<(), FramingError> {
        self.residual.extend_from_slice(data);
        loop {
            let claimed = self.builder.feed(&self.residual)?;
            if claimed == 0 {
                break;
            }
            self.residual.drain(..claimed);
            if self.builder.unit_ready() {
                if let Some(unit) = self.builder.take_unit() {
                    self.ready.push_back(unit);
                }
                self.builder.reset();
            }
        }
        Ok(())
    }

    /// Whether a completed unit is waiting.
    pub fn receive_available(&self) -> bool {
        !self.ready.is_empty()
    }

    pub fn get_front(&self) -> Option<&Unit> {
        self.ready.front()
    }

    pub fn pop_front(&mut self) -> Option<Unit> {
        self.ready.pop_front()
    }

    /// Drop the residual and clear the builder. The ready queue is kept.
    pub fn reset(&mut self) {
        self.residual.clear();
        self.builder.reset();
    }

    /// Bytes received but not yet part of a completed unit.
    pub fn residual(&self) -> &[u8] {
        &self.residual
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
