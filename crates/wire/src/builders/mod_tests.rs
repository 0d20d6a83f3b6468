// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Behavior and boundary tests for the built-in builders.

use yare::parameterized;

use crate::builder::{FramingError, UnitBuilder};
use crate::builders::delimited::DelimitedBuilder;
use crate::builders::fixed::FixedStringBuilder;
use crate::builders::integer::{IntegerBuilder, INTEGER_WIDTH};
use crate::builders::message::{MsgBuilder, HEADER_LEN};
use crate::builders::raw::RawBuilder;

#[test]
fn raw_claims_the_entire_input_as_one_unit() {
    let mut builder = RawBuilder::new();
    let claimed = builder.feed(b"whole buffer").expect("feed failed");
    assert_eq!(claimed, 12);
    assert!(builder.unit_ready());

    let unit = builder.take_unit().expect("unit missing");
    assert_eq!(unit.as_bytes(), Some(&b"whole buffer"[..]));
    assert_eq!(unit.to_network_string(), b"whole buffer");
}

#[test]
fn raw_ignores_empty_input() {
    let mut builder = RawBuilder::new();
    assert_eq!(builder.feed(b"").expect("feed failed"), 0);
    assert!(!builder.unit_ready());
}

#[test]
fn integer_three_byte_prefix_stays_not_ready() {
    let mut builder = IntegerBuilder::new();
    assert_eq!(builder.feed(&[0, 0, 1]).expect("feed failed"), 0);
    assert!(!builder.unit_ready());

    // The fourth byte completes the unit.
    assert_eq!(builder.feed(&[0, 0, 1, 2]).expect("feed failed"), INTEGER_WIDTH);
    assert!(builder.unit_ready());
    let unit = builder.take_unit().expect("unit missing");
    assert_eq!(unit.as_integer(), Some(0x0102));
}

#[test]
fn integer_round_trips_through_create() {
    let unit = IntegerBuilder::create_integer(0xDEAD_BEEF);
    let mut builder = IntegerBuilder::new();
    let claimed = builder.feed(&unit.to_network_string()).expect("feed failed");
    assert_eq!(claimed, INTEGER_WIDTH);
    assert_eq!(builder.take_unit().expect("unit missing"), unit);
}

#[test]
fn integer_create_rejects_wrong_width() {
    let builder = IntegerBuilder::new();
    assert_eq!(
        builder.create(b"abc"),
        Err(FramingError::IntegerWidth { expected: INTEGER_WIDTH, actual: 3 })
    );
}

#[parameterized(
    shorter = { 3 },
    exact = { 8 },
    longer = { 13 },
)]
fn fixed_claims_exactly_the_configured_size(available: usize) {
    let mut builder = FixedStringBuilder::new(8);
    let input: Vec<u8> = (0..available as u8).collect();
    let claimed = builder.feed(&input).expect("feed failed");

    if available < 8 {
        assert_eq!(claimed, 0);
        assert!(!builder.unit_ready());
    } else {
        assert_eq!(claimed, 8);
        let unit = builder.take_unit().expect("unit missing");
        assert_eq!(unit.to_network_string(), &input[..8]);
    }
}

#[test]
fn fixed_create_rejects_size_mismatch() {
    let builder = FixedStringBuilder::new(4);
    assert_eq!(
        builder.create(b"abcde"),
        Err(FramingError::FixedSizeMismatch { actual: 5, size: 4 })
    );
}

#[test]
fn message_parses_header_then_payload() {
    let mut builder = MsgBuilder::new();
    let unit = builder.create(b"hello").expect("create failed");
    let wire = unit.to_network_string();
    assert_eq!(wire.len(), HEADER_LEN + 5);
    assert_eq!(&wire[..HEADER_LEN], &5u32.to_be_bytes());

    // Header alone is not enough.
    assert_eq!(builder.feed(&wire[..HEADER_LEN]).expect("feed failed"), 0);
    assert_eq!(builder.feed(&wire).expect("feed failed"), wire.len());
    assert_eq!(builder.take_unit().expect("unit missing"), unit);
}

#[test]
fn message_payload_at_the_maximum_succeeds() {
    let mut builder = MsgBuilder::with_max_payload(16);
    let payload = vec![7u8; 16];
    let unit = builder.create(&payload).expect("create failed");

    let claimed = builder.feed(&unit.to_network_string()).expect("feed failed");
    assert_eq!(claimed, HEADER_LEN + 16);
    assert_eq!(builder.take_unit().expect("unit missing").as_bytes(), Some(&payload[..]));
}

#[test]
fn message_payload_over_the_maximum_is_a_framing_error() {
    let mut builder = MsgBuilder::with_max_payload(16);
    let mut wire = Vec::new();
    wire.extend_from_slice(&17u32.to_be_bytes());
    wire.extend_from_slice(&vec![7u8; 17]);

    assert_eq!(builder.feed(&wire), Err(FramingError::Overlength { length: 17, max: 16 }));
}

#[test]
fn message_overlength_header_fails_before_the_payload_arrives() {
    let mut builder = MsgBuilder::with_max_payload(16);
    let header = 1_000_000u32.to_be_bytes();
    assert!(matches!(builder.feed(&header), Err(FramingError::Overlength { .. })));
}

#[test]
fn message_create_rejects_an_overlength_payload() {
    let builder = MsgBuilder::with_max_payload(4);
    assert_eq!(
        builder.create(b"abcde"),
        Err(FramingError::Overlength { length: 5, max: 4 })
    );
}

#[test]
fn delimited_ready_only_after_the_delimiter() {
    let mut builder = DelimitedBuilder::new(&b"\r\n"[..]);
    assert_eq!(builder.feed(b"partial").expect("feed failed"), 0);

    let claimed = builder.feed(b"partial line\r\nrest").expect("feed failed");
    assert_eq!(claimed, 14);
    let unit = builder.take_unit().expect("unit missing");
    assert_eq!(unit.as_bytes(), Some(&b"partial line"[..]));
    assert_eq!(unit.to_network_string(), b"partial line\r\n");
}

#[test]
fn delimited_handles_a_delimiter_split_across_feeds() {
    // The manager re-feeds the growing residual; a split "\r" then "\n" must
    // produce exactly one unit once the second half arrives.
    let mut builder = DelimitedBuilder::new(&b"\r\n"[..]);
    assert_eq!(builder.feed(b"line\r").expect("feed failed"), 0);
    assert!(!builder.unit_ready());

    let claimed = builder.feed(b"line\r\n").expect("feed failed");
    assert_eq!(claimed, 6);
    assert_eq!(builder.take_unit().expect("unit missing").as_bytes(), Some(&b"line"[..]));
}

#[test]
fn delimited_create_rejects_payload_containing_the_delimiter() {
    let builder = DelimitedBuilder::new(&b"|"[..]);
    assert_eq!(builder.create(b"a|b"), Err(FramingError::DelimiterInPayload));
}

#[test]
fn delimited_empty_payload_round_trips() {
    let mut builder = DelimitedBuilder::new(&b"|"[..]);
    let unit = builder.create(b"").expect("create failed");
    let claimed = builder.feed(&unit.to_network_string()).expect("feed failed");
    assert_eq!(claimed, 1);
    assert_eq!(builder.take_unit().expect("unit missing"), unit);
}

#[test]
fn cloned_template_does_not_share_parse_state() {
    let template = MsgBuilder::new();
    let unit = template.create(b"x").expect("create failed");
    let wire = unit.to_network_string();

    let mut first = template.clone_box();
    let mut second = template.clone_box();
    assert_eq!(first.feed(&wire).expect("feed failed"), wire.len());
    assert!(first.unit_ready());
    assert!(!second.unit_ready());
    assert_eq!(second.feed(&wire).expect("feed failed"), wire.len());
}
