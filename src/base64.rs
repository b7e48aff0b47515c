//! Standard alphabet, padded Base64 (RFC 4648 section 4).

use crate::encoding::Encoding;
use crate::error::BoxError;
use std::error;
use std::fmt::{self, Display};

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
const PAD: u8 = b'=';

/// The `"base64"` encoding scheme. Byte slices are decoded with it unless an
/// option says otherwise.
#[derive(Copy, Clone, Debug, Default)]
pub struct Base64;

/// Why a Base64 text was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// The text length is not a multiple of four.
    InvalidLength(usize),
    /// A character outside the alphabet, at the given byte offset.
    InvalidByte(usize, u8),
    /// Padding in the middle of the text, or more than two padding
    /// characters.
    InvalidPadding,
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            DecodeError::InvalidLength(len) => write!(f, "invalid base64 length {}", len),
            DecodeError::InvalidByte(offset, b) => {
                write!(f, "invalid base64 byte {:?} at offset {}", b as char, offset)
            }
            DecodeError::InvalidPadding => f.write_str("invalid base64 padding"),
        }
    }
}

impl error::Error for DecodeError {}

fn sextet(b: u8) -> Option<u8> {
    match b {
        b'A'..=b'Z' => Some(b - b'A'),
        b'a'..=b'z' => Some(b - b'a' + 26),
        b'0'..=b'9' => Some(b - b'0' + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Encodes `bytes`, padding the output to a multiple of four characters.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity((bytes.len() + 2) / 3 * 4);
    for chunk in bytes.chunks(3) {
        let b = [
            chunk[0],
            chunk.get(1).copied().unwrap_or(0),
            chunk.get(2).copied().unwrap_or(0),
        ];
        let n = u32::from(b[0]) << 16 | u32::from(b[1]) << 8 | u32::from(b[2]);
        for i in 0..4 {
            if i <= chunk.len() {
                out.push(ALPHABET[(n >> (18 - 6 * i) & 0x3F) as usize] as char);
            } else {
                out.push(PAD as char);
            }
        }
    }
    out
}

/// Decodes padded Base64 text.
pub fn decode(text: &str) -> Result<Vec<u8>, DecodeError> {
    let input = text.as_bytes();
    if input.len() % 4 != 0 {
        return Err(DecodeError::InvalidLength(input.len()));
    }
    let mut out = Vec::with_capacity(input.len() / 4 * 3);
    let quads = input.len() / 4;
    for (q, quad) in input.chunks(4).enumerate() {
        let padding = quad.iter().rev().take_while(|&&b| b == PAD).count();
        if padding > 2 || (padding > 0 && q + 1 != quads) {
            return Err(DecodeError::InvalidPadding);
        }
        let mut n = 0u32;
        for (i, &b) in quad[..4 - padding].iter().enumerate() {
            let v = match sextet(b) {
                Some(v) => v,
                None => return Err(DecodeError::InvalidByte(q * 4 + i, b)),
            };
            n |= u32::from(v) << (18 - 6 * i);
        }
        let bytes = [(n >> 16) as u8, (n >> 8) as u8, n as u8];
        out.extend_from_slice(&bytes[..3 - padding]);
    }
    Ok(out)
}

impl Encoding for Base64 {
    fn encode(&self, bytes: &[u8]) -> String {
        encode(bytes)
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, BoxError> {
        decode(text).map_err(Into::into)
    }
}
