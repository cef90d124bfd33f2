//! Wire encoding for delivered lines.
//!
//! Each record travels as `token + line + '\n'` in UTF-8. Sanitising the line
//! (trailing newline trimming, embedded newline replacement) happens before
//! encoding; see [`sanitise_line`](crate::appender::sanitise_line).

use std::fmt;

/// Record terminator appended to every payload.
pub const TERMINATOR: u8 = b'\n';

/// One encoded, ready-to-send record.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Payload(Box<[u8]>);

impl Payload {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0.into_vec()
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Payload")
            .field(&String::from_utf8_lossy(&self.0))
            .finish()
    }
}

/// Concatenate `token`, `line` and the terminator into a payload.
pub fn encode(token: &str, line: &str) -> Payload {
    let mut buf = Vec::with_capacity(token.len() + line.len() + 1);
    buf.extend_from_slice(token.as_bytes());
    buf.extend_from_slice(line.as_bytes());
    buf.push(TERMINATOR);
    Payload::from(buf)
}
