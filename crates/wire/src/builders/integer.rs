// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-width network-order unsigned integer framing.

use crate::builder::{FramingError, UnitBuilder};
use crate::unit::{Unit, UnitValue};

/// Width of an integer unit on the wire.
pub const INTEGER_WIDTH: usize = 4;

#[derive(Debug, Clone, Default)]
pub struct IntegerBuilder {
    pending: Option<Unit>,
}

impl IntegerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outgoing unit for an integer value.
    pub fn create_integer(value: u32) -> Unit {
        Unit::from_parts(UnitValue::Integer(value), value.to_be_bytes().to_vec())
    }
}

impl UnitBuilder for IntegerBuilder {
    fn feed(&mut self, input: &[u8]) -> Result<usize, FramingError> {
        if self.pending.is_some() || input.len() < INTEGER_WIDTH {
            return Ok(0);
        }
        let value = u32::from_be_bytes([input[0], input[1], input[2], input[3]]);
        self.pending =
            Some(Unit::from_parts(UnitValue::Integer(value), input[..INTEGER_WIDTH].to_vec()));
        Ok(INTEGER_WIDTH)
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
        if payload.len() != INTEGER_WIDTH {
            return Err(FramingError::IntegerWidth {
                expected: INTEGER_WIDTH,
                actual: payload.len(),
            });
        }
        let value = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
        Ok(Self::create_integer(value))
    }

    fn clone_box(&self) -> Box<dyn UnitBuilder> {
        Box::new(self.clone())
    }
}
