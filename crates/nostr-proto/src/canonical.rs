//! Byte-exact NIP-01 canonical serialization.
//!
//! `serde_json` escapes `<`, `>`, `&` under some configurations and some
//! serializers fall back to `\uXXXX` for non-ASCII text; either divergence
//! mis-computes `id` for real-world events. This module writes the canonical
//! array by hand instead of trusting a general-purpose encoder.

use crate::event::UnsignedEvent;

/// Appends the minimally-escaped JSON string literal for `s` to `out`.
///
/// Only the characters NIP-01 requires are escaped: the named single-char
/// escapes, `\u00XX` for the remaining C0 controls, and nothing else. `/`,
/// non-ASCII bytes, and HTML-sensitive characters pass through unescaped.
fn write_json_string(out: &mut Vec<u8>, s: &str) {
    out.push(b'"');
    for ch in s.chars() {
        match ch {
            '"' => out.extend_from_slice(b"\\\""),
            '\\' => out.extend_from_slice(b"\\\\"),
            '\u{08}' => out.extend_from_slice(b"\\b"),
            '\u{09}' => out.extend_from_slice(b"\\t"),
            '\u{0A}' => out.extend_from_slice(b"\\n"),
            '\u{0C}' => out.extend_from_slice(b"\\f"),
            '\u{0D}' => out.extend_from_slice(b"\\r"),
            c if (c as u32) < 0x20 => {
                out.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
        }
    }
    out.push(b'"');
}

fn write_tags(out: &mut Vec<u8>, tags: &[Vec<String>]) {
    out.push(b'[');
    for (i, tag) in tags.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        out.push(b'[');
        for (j, item) in tag.iter().enumerate() {
            if j > 0 {
                out.push(b',');
            }
            write_json_string(out, item);
        }
        out.push(b']');
    }
    out.push(b']');
}

/// Produces the exact UTF-8 bytes of `[0,pubkey,created_at,kind,tags,content]`
/// as defined by NIP-01 for computing an event's identity hash.
pub fn canonical_bytes(event: &UnsignedEvent) -> Vec<u8> {
    let mut out = Vec::with_capacity(128 + event.content.len());
    out.extend_from_slice(b"[0,");
    write_json_string(&mut out, &event.pubkey);
    out.push(b',');
    out.extend_from_slice(event.created_at.to_string().as_bytes());
    out.push(b',');
    out.extend_from_slice(event.kind.to_string().as_bytes());
    out.push(b',');
    write_tags(&mut out, &event.tags);
    out.push(b',');
    write_json_string(&mut out, &event.content);
    out.push(b']');
    out
}
