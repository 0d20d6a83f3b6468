// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The application-layer message as seen after framing.

/// Payload of a [`Unit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitValue {
    /// Absent payload.
    Null,
    /// A byte string.
    Bytes(Vec<u8>),
    /// A fixed-width network-order unsigned integer.
    Integer(u32),
    /// A composite of child units.
    Composite(Vec<Unit>),
    /// An error marker with a message.
    Error(String),
}

/// An immutable application message.
///
/// A unit carries both its decoded value and its exact on-wire form, so that
/// re-encoding what a builder parsed reproduces the input byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    value: UnitValue,
    wire: Vec<u8>,
}

impl Unit {
    pub(crate) fn from_parts(value: UnitValue, wire: Vec<u8>) -> Self {
        Self { value, wire }
    }

    pub fn null() -> Self {
        Self { value: UnitValue::Null, wire: Vec::new() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { value: UnitValue::Error(message.into()), wire: Vec::new() }
    }

    /// A composite whose wire form is the concatenation of its children's.
    pub fn composite(children: Vec<Unit>) -> Self {
        let wire = children.iter().flat_map(|c| c.to_network_string()).collect();
        Self { value: UnitValue::Composite(children), wire }
    }

    pub fn value(&self) -> &UnitValue {
        &self.value
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.value {
            UnitValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self.value {
            UnitValue::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.value, UnitValue::Null)
    }

    pub fn is_error(&self) -> bool {
        matches!(self.value, UnitValue::Error(_))
    }

    /// The bytes to ship: exactly what the paired builder would re-parse.
    pub fn to_network_string(&self) -> Vec<u8> {
        self.wire.clone()
    }

    /// Human-readable projection for logs and debugging.
    pub fn to_printable_string(&self) -> String {
        match &self.value {
            UnitValue::Null => "<null>".to_string(),
            UnitValue::Bytes(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            UnitValue::Integer(value) => value.to_string(),
            UnitValue::Composite(children) => children
                .iter()
                .map(Unit::to_printable_string)
                .collect::<Vec<_>>()
                .join(" "),
            UnitValue::Error(message) => format!("<error: {message}>"),
        }
    }
}

#[cfg(test)]
#[path = "unit_tests.rs"]
mod tests;
