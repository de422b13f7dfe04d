//! Unit tests for the frame codec and the session-wrapper demux.

use bytes::BytesMut;
use cobalt_stomp::codec::{self, ParseError, SessionPulse};
use cobalt_stomp::{Command, Frame};

fn encode_to_vec(frame: &Frame) -> Vec<u8> {
    let mut buf = BytesMut::new();
    codec::encode(frame, &mut buf);
    buf.to_vec()
}

// =============================================================================
// Encoding tests
// =============================================================================

#[test]
fn encode_basic_frame() {
    let frame = Frame::new(Command::Send)
        .header("destination", "/queue/a")
        .set_body("hello");
    assert_eq!(encode_to_vec(&frame), b"SEND\ndestination:/queue/a\n\nhello\0");
}

#[test]
fn encode_empty_body_keeps_blank_line() {
    let frame = Frame::new(Command::Ack).header("id", "msg-1");
    assert_eq!(encode_to_vec(&frame), b"ACK\nid:msg-1\n\n\0");
}

#[test]
fn encode_no_headers() {
    let frame = Frame::new(Command::Disconnect);
    assert_eq!(encode_to_vec(&frame), b"DISCONNECT\n\n\0");
}

#[test]
fn encode_preserves_header_order_and_duplicates() {
    let frame = Frame::new(Command::Subscribe)
        .header("id", "sub-0")
        .header("id", "sub-1");
    assert_eq!(encode_to_vec(&frame), b"SUBSCRIBE\nid:sub-0\nid:sub-1\n\n\0");
}

#[test]
fn encode_does_not_escape_header_values() {
    // callers own protocol safety; the codec writes values verbatim
    let frame = Frame::new(Command::Send).header("destination", "/queue/a:b");
    assert_eq!(encode_to_vec(&frame), b"SEND\ndestination:/queue/a:b\n\n\0");
}

// =============================================================================
// Decoding tests
// =============================================================================

#[test]
fn decode_basic_frame() {
    let frame = codec::decode(b"MESSAGE\nsubscription:sub-0\nack:msg-1\n\nhi there\0").unwrap();
    assert_eq!(frame.command, Command::Message);
    assert_eq!(frame.header_value("subscription"), "sub-0");
    assert_eq!(frame.header_value("ack"), "msg-1");
    assert_eq!(frame.body, "hi there");
}

#[test]
fn decode_splits_on_first_colon() {
    let frame = codec::decode(b"MESSAGE\ndestination:/queue/a:b\n\n\0").unwrap();
    assert_eq!(frame.header_value("destination"), "/queue/a:b");
}

#[test]
fn decode_line_without_colon_is_empty_valued_header() {
    let frame = codec::decode(b"CONNECTED\nversion\n\n\0").unwrap();
    assert_eq!(frame.headers, vec![("version".to_string(), String::new())]);
}

#[test]
fn decode_without_blank_line_has_empty_body() {
    let frame = codec::decode(b"RECEIPT\nreceipt-id:3").unwrap();
    assert_eq!(frame.command, Command::Receipt);
    assert_eq!(frame.header_value("receipt-id"), "3");
    assert_eq!(frame.body, "");
}

#[test]
fn decode_tolerates_crlf() {
    let frame = codec::decode(b"CONNECTED\r\nheart-beat:0,0\r\n\r\nbody\0").unwrap();
    assert_eq!(frame.command, Command::Connected);
    assert_eq!(frame.header_value("heart-beat"), "0,0");
    assert_eq!(frame.body, "body");
}

#[test]
fn decode_strips_trailing_nul() {
    let frame = codec::decode(b"RECEIPT\n\n\0").unwrap();
    assert_eq!(frame.body, "");
}

#[test]
fn decode_empty_payload_is_missing_command() {
    assert_eq!(codec::decode(b""), Err(ParseError::MissingCommand));
    assert_eq!(codec::decode(b"\0"), Err(ParseError::MissingCommand));
}

#[test]
fn decode_unknown_verb() {
    assert_eq!(
        codec::decode(b"BEGIN\ntransaction:tx1\n\n\0"),
        Err(ParseError::UnknownCommand("BEGIN".to_string()))
    );
}

#[test]
fn decode_body_may_contain_newlines() {
    let frame = codec::decode(b"MESSAGE\n\nline one\nline two\0").unwrap();
    assert_eq!(frame.body, "line one\nline two");
}

// =============================================================================
// Round-trip tests
// =============================================================================

#[test]
fn round_trip_preserves_frame() {
    let frame = Frame::new(Command::Message)
        .header("subscription", "sub-3")
        .header("message-id", "m-17")
        .header("message-id", "m-17-dup")
        .set_body("payload text");
    assert_eq!(codec::decode(&encode_to_vec(&frame)).unwrap(), frame);
}

#[test]
fn round_trip_empty_headers_and_body() {
    let frame = Frame::new(Command::Disconnect);
    assert_eq!(codec::decode(&encode_to_vec(&frame)).unwrap(), frame);
}

#[test]
fn round_trip_multiline_body() {
    let frame = Frame::new(Command::Send)
        .header("destination", "/topic/x")
        .set_body("a\nb\nc");
    assert_eq!(codec::decode(&encode_to_vec(&frame)).unwrap(), frame);
}

// =============================================================================
// Heartbeat detection
// =============================================================================

#[test]
fn heartbeat_detection() {
    assert!(codec::is_heartbeat(b"\n"));
    assert!(codec::is_heartbeat(b"\r\n"));
    assert!(codec::is_heartbeat(b"\n\n"));
    assert!(!codec::is_heartbeat(b""));
    assert!(!codec::is_heartbeat(b"x\n"));
}

// =============================================================================
// Session-wrapper demux
// =============================================================================

#[test]
fn demux_heartbeat_pulse() {
    assert_eq!(codec::demux_session_payload(b"h"), Some(SessionPulse::Heartbeat));
}

#[test]
fn demux_open_pulse() {
    assert_eq!(codec::demux_session_payload(b"o"), Some(SessionPulse::Open));
}

#[test]
fn demux_data_pulse_strips_marker() {
    assert_eq!(
        codec::demux_session_payload(b"aXYZ"),
        Some(SessionPulse::Data(b"XYZ"))
    );
}

#[test]
fn demux_unknown_marker() {
    assert_eq!(codec::demux_session_payload(b"c[3000]"), Some(SessionPulse::Other(b'c')));
}

#[test]
fn demux_empty_payload() {
    assert_eq!(codec::demux_session_payload(b""), None);
}

#[test]
fn array_envelope_is_stripped_and_unescaped() {
    let unwrapped = codec::strip_array_envelope(b"[\"CONNECTED\\nheart-beat:0,0\\n\\n\"]");
    assert_eq!(unwrapped, b"CONNECTED\nheart-beat:0,0\n\n");
}

#[test]
fn array_envelope_decodes_escapes() {
    let unwrapped = codec::strip_array_envelope(b"[\"a\\\\b\\\"c\\u0041\"]");
    assert_eq!(unwrapped, b"a\\b\"cA");
}

#[test]
fn payload_without_envelope_passes_through() {
    let raw = b"MESSAGE\n\nplain";
    assert_eq!(codec::strip_array_envelope(raw), raw.to_vec());
}

#[test]
fn enveloped_frame_decodes_end_to_end() {
    let data = codec::strip_array_envelope(b"[\"MESSAGE\\nsubscription:sub-0\\n\\nhi\\u0000\"]");
    let frame = codec::decode(&data).unwrap();
    assert_eq!(frame.command, Command::Message);
    assert_eq!(frame.body, "hi");
}
