// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed message framing: `[u32 length, big-endian][payload]`.

use crate::builder::{FramingError, UnitBuilder};
use crate::unit::{Unit, UnitValue};

/// Width of the length prefix.
pub const HEADER_LEN: usize = 4;

/// Default cap on a single message payload.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct MsgBuilder {
    max_payload: usize,
    pending: Option<Unit>,
}

impl MsgBuilder {
    pub fn new() -> Self {
        Self { max_payload: DEFAULT_MAX_PAYLOAD, pending: None }
    }

    pub fn with_max_payload(max_payload: usize) -> Self {
        assert!(max_payload > 0, "maximum payload must be positive");
        Self { max_payload, pending: None }
    }

    pub fn max_payload(&self) -> usize {
        self.max_payload
    }
}

impl Default for MsgBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitBuilder for MsgBuilder {
    fn feed(&mut self, input: &[u8]) -> Result<usize, FramingError> {
        if self.pending.is_some() || input.len() < HEADER_LEN {
            return Ok(0);
        }
        let length = u32::from_be_bytes([input[0], input[1], input[2], input[3]]) as usize;
        // An overlength header fails the stream before the payload arrives.
        if length > self.max_payload {
            return Err(FramingError::Overlength { length, max: self.max_payload });
        }
        let total = HEADER_LEN + length;
        if input.len() < total {
            return Ok(0);
        }
        let payload = input[HEADER_LEN..total].to_vec();
        self.pending = Some(Unit::from_parts(UnitValue::Bytes(payload), input[..total].to_vec()));
        Ok(total)
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
        if payload.len() > self.max_payload {
            return Err(FramingError::Overlength {
                length: payload.len(),
                max: self.max_payload,
            });
        }
        let mut wire = Vec::with_capacity(HEADER_LEN + payload.len());
        wire.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        wire.extend_from_slice(payload);
        Ok(Unit::from_parts(UnitValue::Bytes(payload.to_vec()), wire))
    }

    fn clone_box(&self) -> Box<dyn UnitBuilder> {
        Box::new(self.clone())
    }
}
