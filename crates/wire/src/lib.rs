// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol framing: byte streams in, application units out.
//!
//! A [`UnitBuilder`] is an incremental framing state machine. Fed a byte
//! stream in arbitrary chunks, it claims complete units and leaves everything
//! else untouched; it also produces the on-wire form of outgoing units. The
//! per-connection [`UnitBuilderManager`] owns one builder, the residual byte
//! buffer, and the queue of fully parsed units.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod builder;
mod builders;
mod manager;
mod unit;

pub use builder::{FramingError, UnitBuilder};
pub use builders::delimited::DelimitedBuilder;
pub use builders::fixed::FixedStringBuilder;
pub use builders::integer::{IntegerBuilder, INTEGER_WIDTH};
pub use builders::message::{MsgBuilder, DEFAULT_MAX_PAYLOAD, HEADER_LEN};
pub use builders::raw::RawBuilder;
pub use manager::UnitBuilderManager;
pub use unit::{Unit, UnitValue};
