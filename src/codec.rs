//! Stateless translation between [`Frame`] values and wire bytes, plus the
//! session-wrapper (SockJS-style) marker demux layered outside the STOMP
//! grammar.

use bytes::{BufMut, BytesMut};
use thiserror::Error;

use crate::frame::{Command, Frame};

/// Errors produced while decoding wire bytes into a [`Frame`].
///
/// Callers drop the offending payload rather than propagating these; a
/// malformed frame must never take the session down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The payload carries no command line at all.
    #[error("payload has no command line")]
    MissingCommand,
    /// The command line is not one of the supported verbs.
    #[error("unknown command verb '{0}'")]
    UnknownCommand(String),
}

/// Encode a frame into `dst`: command line, one line per header in supplied
/// order, a blank line, the body verbatim, and the NUL frame terminator.
///
/// Header values are written as-is; callers are responsible for
/// protocol-safe content.
pub fn encode(frame: &Frame, dst: &mut BytesMut) {
    dst.extend_from_slice(frame.command.as_str().as_bytes());
    dst.put_u8(b'\n');
    for (k, v) in &frame.headers {
        dst.extend_from_slice(k.as_bytes());
        dst.put_u8(b':');
        dst.extend_from_slice(v.as_bytes());
        dst.put_u8(b'\n');
    }
    dst.put_u8(b'\n');
    dst.extend_from_slice(frame.body.as_bytes());
    dst.put_u8(0);
}

/// True when the payload is nothing but line terminators, i.e. a heartbeat
/// pulse rather than a frame.
pub fn is_heartbeat(payload: &[u8]) -> bool {
    !payload.is_empty() && payload.iter().all(|&b| b == b'\n' || b == b'\r')
}

fn strip_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Decode one frame from a transport payload.
///
/// The first line is the command token; subsequent lines up to the first
/// blank line become headers (first colon splits key from value, and a line
/// without a colon is kept as a header with an empty value); everything after
/// the blank line is the body. Trailing NUL terminators are stripped.
pub fn decode(payload: &[u8]) -> Result<Frame, ParseError> {
    let mut end = payload.len();
    while end > 0 && payload[end - 1] == 0 {
        end -= 1;
    }
    let payload = &payload[..end];

    let (cmd_line, mut pos) = match payload.iter().position(|&b| b == b'\n') {
        Some(i) => (&payload[..i], i + 1),
        None => (payload, payload.len()),
    };
    let cmd_line = strip_cr(cmd_line);
    if cmd_line.is_empty() {
        return Err(ParseError::MissingCommand);
    }
    let verb = String::from_utf8_lossy(cmd_line);
    let command =
        Command::from_verb(&verb).ok_or_else(|| ParseError::UnknownCommand(verb.into_owned()))?;

    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body_start = None;
    while pos < payload.len() {
        let (line, next) = match payload[pos..].iter().position(|&b| b == b'\n') {
            Some(i) => (&payload[pos..pos + i], pos + i + 1),
            None => (&payload[pos..], payload.len()),
        };
        let line = strip_cr(line);
        if line.is_empty() {
            body_start = Some(next);
            break;
        }
        match line.iter().position(|&b| b == b':') {
            Some(colon) => headers.push((lossy(&line[..colon]), lossy(&line[colon + 1..]))),
            None => headers.push((lossy(line), String::new())),
        }
        pos = next;
    }

    let body = body_start
        .map(|start| lossy(&payload[start..]))
        .unwrap_or_default();

    Ok(Frame {
        command,
        headers,
        body,
    })
}

/// One demultiplexed session-wrapper pulse.
///
/// These markers are framing at the session-wrapper level, not STOMP; they
/// must be stripped before frame decoding is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPulse<'a> {
    /// `h`: wrapper-level keepalive.
    Heartbeat,
    /// `o`: session opened; STOMP negotiation may begin.
    Open,
    /// `a`: a data pulse carrying a STOMP frame.
    Data(&'a [u8]),
    /// Any other marker byte; callers drop these.
    Other(u8),
}

/// Classify a transport payload by its leading session-wrapper marker.
/// Returns `None` for an empty payload.
pub fn demux_session_payload(payload: &[u8]) -> Option<SessionPulse<'_>> {
    match payload.first()? {
        b'h' => Some(SessionPulse::Heartbeat),
        b'o' => Some(SessionPulse::Open),
        b'a' => Some(SessionPulse::Data(&payload[1..])),
        &marker => Some(SessionPulse::Other(marker)),
    }
}

/// Remove the `["…"]` array envelope from a session-wrapper data pulse,
/// decoding the string escapes the wrapper applies. Payloads without an
/// envelope pass through untouched.
pub fn strip_array_envelope(data: &[u8]) -> Vec<u8> {
    let trimmed: &[u8] = {
        let mut s = data;
        while let Some((first, rest)) = s.split_first() {
            if first.is_ascii_whitespace() {
                s = rest;
            } else {
                break;
            }
        }
        while let Some((last, rest)) = s.split_last() {
            if last.is_ascii_whitespace() {
                s = rest;
            } else {
                break;
            }
        }
        s
    };
    if trimmed.len() >= 4 && trimmed.starts_with(b"[\"") && trimmed.ends_with(b"\"]") {
        unescape(&trimmed[2..trimmed.len() - 2])
    } else {
        data.to_vec()
    }
}

fn unescape(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'\\' && i + 1 < raw.len() {
            match raw[i + 1] {
                b'n' => {
                    out.push(b'\n');
                    i += 2;
                }
                b'r' => {
                    out.push(b'\r');
                    i += 2;
                }
                b't' => {
                    out.push(b'\t');
                    i += 2;
                }
                b'"' => {
                    out.push(b'"');
                    i += 2;
                }
                b'\\' => {
                    out.push(b'\\');
                    i += 2;
                }
                b'/' => {
                    out.push(b'/');
                    i += 2;
                }
                b'u' if i + 6 <= raw.len() => {
                    let hex = std::str::from_utf8(&raw[i + 2..i + 6]).ok();
                    match hex.and_then(|h| u32::from_str_radix(h, 16).ok()) {
                        Some(code) => {
                            let mut buf = [0u8; 4];
                            let ch = char::from_u32(code).unwrap_or('\u{fffd}');
                            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
                            i += 6;
                        }
                        None => {
                            out.push(raw[i]);
                            i += 1;
                        }
                    }
                }
                _ => {
                    // unknown escape, keep the backslash as-is
                    out.push(raw[i]);
                    i += 1;
                }
            }
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}
