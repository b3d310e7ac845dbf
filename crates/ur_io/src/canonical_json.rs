//! Canonical JSON bytes for stored snapshots.
//! - Objects: keys sorted lexicographically (UTF-8 codepoint order)
//! - Arrays: order preserved (caller is responsible for stable ordering)
//! - Output: compact, LF-terminated

use serde::Serialize;
use serde_json::Value;

use crate::CodecResult;

/// Serialize `t` to canonical, LF-terminated UTF-8 bytes.
///
/// Two snapshots with equal content always produce identical bytes, so
/// stored states are diffable and safe to compare byte-wise.
pub fn to_canonical_bytes<T: Serialize>(t: &T) -> CodecResult<Vec<u8>> {
    let v = serde_json::to_value(t)?;
    let mut out = Vec::with_capacity(256);
    write_canonical_value(&v, &mut out);
    out.push(b'\n');
    Ok(out)
}

fn write_canonical_value(v: &Value, out: &mut Vec<u8>) {
    match v {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        Value::Number(n) => out.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => {
            // serde_json produces a correctly escaped JSON string literal.
            let quoted = serde_json::to_string(s).unwrap_or_default();
            out.extend_from_slice(quoted.as_bytes());
        }
        Value::Array(arr) => {
            out.push(b'[');
            let mut first = true;
            for elem in arr {
                if !first {
                    out.push(b',');
                }
                first = false;
                write_canonical_value(elem, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            out.push(b'{');
            let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
            keys.sort_unstable();
            let mut first = true;
            for k in keys {
                if !first {
                    out.push(b',');
                }
                first = false;
                let quoted = serde_json::to_string(k).unwrap_or_default();
                out.extend_from_slice(quoted.as_bytes());
                out.push(b':');
                write_canonical_value(&map[k], out);
            }
            out.push(b'}');
        }
    }
}
