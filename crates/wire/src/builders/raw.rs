// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pass-through framing: one buffer is one unit.

use crate::builder::{FramingError, UnitBuilder};
use crate::unit::{Unit, UnitValue};

#[derive(Debug, Clone, Default)]
pub struct RawBuilder {
    pending: Option<Unit>,
}

impl RawBuilder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UnitBuilder for RawBuilder {
    fn feed(&mut self, input: &[u8]) -> Result<usize, FramingError> {
        if self.pending.is_some() || input.is_empty() {
            return Ok(0);
        }
        self.pending =
            Some(Unit::from_parts(UnitValue::Bytes(input.to_vec()), input.to_vec()));
        Ok(input.len())
    }

    fn unit_ready(&self) -> bool {
        self.pending.is_some()
    }

    fn take_unit(&mut self) -> Option<Unit> {
        self.pending.take()
    }

    fn reset(&mut self) {
        self.pending = None;
    }

    fn create(&self, payload: &[u8]) -> Result<Unit, FramingError> {
        Ok(Unit::from_parts(UnitValue::Bytes(payload.to_vec()), payload.to_vec()))
    }

    fn clone_box(&self) -> Box<dyn UnitBuilder> {
        Box::new(self.clone())
    }
}
