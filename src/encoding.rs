//! Binary-to-text schemes used when a string node fills a byte buffer.
//!
//! Schemes are looked up by name, either from a field tag
//! (`#[tag = "blob,hex"]`) or through [`EncodingRegistry::lookup`] when
//! building [`Options`](crate::Options) by hand.

use crate::base64::Base64;
use crate::error::BoxError;
use std::collections::HashMap;
use std::error;
use std::fmt::{self, Display};
use std::sync::{Arc, OnceLock, RwLock};

/// A reversible transform between bytes and text.
pub trait Encoding: Send + Sync {
    /// Renders `bytes` as text.
    fn encode(&self, bytes: &[u8]) -> String;

    /// Recovers the bytes from `text`, failing on malformed input.
    fn decode(&self, text: &str) -> Result<Vec<u8>, BoxError>;
}

/// The `"hex"` encoding scheme: two lowercase hexadecimal digits per byte.
/// Uppercase digits are accepted when decoding.
#[derive(Copy, Clone, Debug, Default)]
pub struct Hex;

/// Why a hexadecimal text was rejected.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HexError {
    /// The text has an odd number of digits.
    OddLength,
    /// A character which is not a hexadecimal digit, at the given offset.
    InvalidDigit(usize, char),
}

impl Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            HexError::OddLength => f.write_str("odd length hex string"),
            HexError::InvalidDigit(offset, c) => {
                write!(f, "invalid hex digit {:?} at offset {}", c, offset)
            }
        }
    }
}

impl error::Error for HexError {}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

impl Encoding for Hex {
    fn encode(&self, bytes: &[u8]) -> String {
        let mut out = String::with_capacity(bytes.len() * 2);
        for &b in bytes {
            out.push(HEX_DIGITS[(b >> 4) as usize] as char);
            out.push(HEX_DIGITS[(b & 0xF) as usize] as char);
        }
        out
    }

    fn decode(&self, text: &str) -> Result<Vec<u8>, BoxError> {
        if text.len() % 2 != 0 {
            return Err(HexError::OddLength.into());
        }
        let digit = |i: usize, b: u8| {
            (b as char)
                .to_digit(16)
                .ok_or(HexError::InvalidDigit(i, b as char))
        };
        let mut out = Vec::with_capacity(text.len() / 2);
        for (i, pair) in text.as_bytes().chunks(2).enumerate() {
            let hi = digit(2 * i, pair[0])?;
            let lo = digit(2 * i + 1, pair[1])?;
            out.push((hi << 4 | lo) as u8);
        }
        Ok(out)
    }
}

/// Maps scheme names to encodings.
///
/// `"base64"` and `"hex"` are present in every registry from the start.
/// Lookups take a shared lock, registration an exclusive one, so a registry
/// may be filled while other threads decode with it.
pub struct EncodingRegistry {
    schemes: RwLock<HashMap<String, Arc<dyn Encoding>>>,
}

impl EncodingRegistry {
    /// Creates a registry holding only the built-in schemes.
    pub fn new() -> Self {
        let mut schemes: HashMap<String, Arc<dyn Encoding>> = HashMap::new();
        schemes.insert("base64".to_owned(), Arc::new(Base64));
        schemes.insert("hex".to_owned(), Arc::new(Hex));
        EncodingRegistry {
            schemes: RwLock::new(schemes),
        }
    }

    /// The process-wide registry used when the decode context names none.
    pub fn global() -> &'static EncodingRegistry {
        static GLOBAL: OnceLock<EncodingRegistry> = OnceLock::new();
        GLOBAL.get_or_init(EncodingRegistry::new)
    }

    /// Registers `encoding` under `name`.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered. Registration belongs to
    /// program setup; a clash is a programming error.
    pub fn register<E>(&self, name: &str, encoding: E)
    where
        E: Encoding + 'static,
    {
        let mut schemes = match self.schemes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if schemes.contains_key(name) {
            panic!("jtree: encoding `{}` is already registered", name);
        }
        tracing::debug!(name, "registered encoding");
        schemes.insert(name.to_owned(), Arc::new(encoding));
    }

    /// Returns the encoding registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Encoding>> {
        let schemes = match self.schemes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        schemes.get(name).cloned()
    }
}

impl Default for EncodingRegistry {
    fn default() -> Self {
        EncodingRegistry::new()
    }
}

impl fmt::Debug for EncodingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let schemes = match self.schemes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut names: Vec<&String> = schemes.keys().collect();
        names.sort();
        f.debug_struct("EncodingRegistry")
            .field("schemes", &names)
            .finish()
    }
}
