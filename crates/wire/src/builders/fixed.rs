// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-length string framing: exactly N bytes per unit.

use crate::builder::{FramingError, UnitBuilder};
use crate::unit::{Unit, UnitValue};

#[derive(Debug, Clone)]
pub struct FixedStringBuilder {
    size: usize,
    pending: Option<Unit>,
}

impl FixedStringBuilder {
    pub fn new(size: usize) -> Self {
        assert!(size > 0, "fixed unit size must be positive");
        Self { size, pending: None }
    }

    pub fn set_size(&mut self, size: usize) {
        assert!(size > 0, "fixed unit size must be positive");
        self.size = size;
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

impl UnitBuilder for FixedStringBuilder {
    fn feed(&mut self, input: &[u8]) -> Result<usize, FramingError> {
        if self.pending.is_some() || input.len() < self.size {
            return Ok(0);
        }
        let claimed = &input[..self.size];
        self.pending = Some(Unit::from_parts(UnitValue::Bytes(claimed.to_vec()), claimed.to_vec()));
        Ok(self.size)
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
        if payload.len() != self.size {
            return Err(FramingError::FixedSizeMismatch {
                actual: payload.len(),
                size: self.size,
            });
        }
        Ok(Unit::from_parts(UnitValue::Bytes(payload.to_vec()), payload.to_vec()))
    }

    fn clone_box(&self) -> Box<dyn UnitBuilder> {
        Box::new(self.clone())
    }
}
