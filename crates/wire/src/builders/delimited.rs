// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delimited stream framing: `payload <delim> payload <delim> …`.

use crate::builder::{FramingError, UnitBuilder};
use crate::unit::{Unit, UnitValue};

#[derive(Debug, Clone)]
pub struct DelimitedBuilder {
    delimiter: Vec<u8>,
    pending: Option<Unit>,
}

impl DelimitedBuilder {
    pub fn new(delimiter: impl Into<Vec<u8>>) -> Self {
        let delimiter = delimiter.into();
        assert!(!delimiter.is_empty(), "delimiter must not be empty");
        Self { delimiter, pending: None }
    }

    pub fn delimiter(&self) -> &[u8] {
        &self.delimiter
    }
}

impl UnitBuilder for DelimitedBuilder {
    fn feed(&mut self, input: &[u8]) -> Result<usize, FramingError> {
        if self.pending.is_some() {
            return Ok(0);
        }
        match find_subsequence(input, &self.delimiter) {
            Some(position) => {
                let total = position + self.delimiter.len();
                self.pending = Some(Unit::from_parts(
                    UnitValue::Bytes(input[..position].to_vec()),
                    input[..total].to_vec(),
                ));
                Ok(total)
            }
            None => Ok(0),
        }
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
        if find_subsequence(payload, &self.delimiter).is_some() {
            return Err(FramingError::DelimiterInPayload);
        }
        let mut wire = Vec::with_capacity(payload.len() + self.delimiter.len());
        wire.extend_from_slice(payload);
        wire.extend_from_slice(&self.delimiter);
        Ok(Unit::from_parts(UnitValue::Bytes(payload.to_vec()), wire))
    }

    fn clone_box(&self) -> Box<dyn UnitBuilder> {
        Box::new(self.clone())
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}
