//! # jtree
//!
//! JSON is parsed into a syntax tree first and converted into Rust data
//! structures second. The tree, a [`Node`], keeps every number as an exact
//! decimal and every object in document order, so nothing is lost before the
//! destination type is known.
//!
//! ```
//! # fn main() -> jtree::Result<()> {
//! let node = jtree::parse_str(r#"
//!     {
//!         "name": "John Doe",
//!         "age": 43,
//!         "phones": [
//!             "+44 1234567",
//!             "+44 2345678",
//!         ],
//!     }"#)?;
//!
//! assert_eq!(node["name"].as_str(), Some("John Doe"));
//! assert_eq!(node["phones"][1].as_str(), Some("+44 2345678"));
//!
//! let mut age = 0u8;
//! node["age"].decode(&mut age)?;
//! assert_eq!(age, 43);
//! # Ok(())
//! # }
//! ```
//!
//! Note the trailing commas: the parser accepts one before the closing
//! bracket or brace of any container.
//!
//! # Decoding into Rust types
//!
//! Any type implementing [`Decode`] can be filled from a node. The crate
//! covers integers, floats, `bool`, `String`, byte buffers, `Option`, `Box`,
//! sequences, maps with textual keys, `SystemTime`, `BigInt`, [`Number`] and
//! the dynamic [`Value`]. Structs get it from the [`record!`] macro:
//!
//! ```
//! #[derive(Debug, Default, PartialEq)]
//! pub struct Person {
//!     pub name: String,
//!     pub age: u8,
//!     pub phones: Vec<String>,
//! }
//!
//! jtree::record! {
//!     Person {
//!         pub name,
//!         pub age,
//!         pub phones,
//!     }
//! }
//!
//! # fn main() -> jtree::Result<()> {
//! let p: Person = jtree::from_str(r#"{"name": "John", "age": 43, "phones": []}"#)?;
//! assert_eq!(p.name, "John");
//! # Ok(())
//! # }
//! ```
//!
//! How a node converts is tuned with [`Options`]: string mode, binary
//! encodings for byte buffers, options for container elements and the
//! registries of abstract types and encodings. Trait objects are decoded
//! through constructors registered in a [`TypeRegistry`].

#![doc(html_root_url = "https://docs.rs/jtree/0.1.0")]
#![warn(missing_docs)]
#![allow(
    clippy::match_like_matches_macro,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::needless_doctest_main,
    clippy::new_without_default
)]

// We only use our own error type; no need for From conversions provided by the
// standard library's try! macro.
macro_rules! tri {
    ($e:expr $(,)?) => {
        match $e {
            core::result::Result::Ok(val) => val,
            core::result::Result::Err(err) => return core::result::Result::Err(err),
        }
    };
}

pub use crate::de::{Decode, MapKey};
pub use crate::encoding::{Encoding, EncodingRegistry, Hex, HexError};
pub use crate::error::{BoxError, Category, Error, ErrorCode, Result};
pub use crate::map::Map;
pub use crate::node::{Node, Object};
pub use crate::number::Number;
pub use crate::options::{Context, Options};
pub use crate::parser::Parser;
pub use crate::record::{
    decode_record, visible_fields, EmbedInfo, FieldDef, FieldOptions, Record, StructField,
};
pub use crate::registry::{Abstract, Constructor, Poly, TypeRegistry};
pub use crate::token::{Token, Tokenizer};
pub use crate::value::Value;

pub mod base64;
pub mod de;
pub mod encoding;
pub mod error;
pub mod map;
pub mod node;
pub mod number;
pub mod options;
pub mod parser;
pub mod read;
pub mod record;
pub mod registry;
pub mod token;
pub mod value;

use crate::read::{IoRead, Read, SliceRead, StrRead};
use std::io;

fn parse_one<R: Read>(mut parser: Parser<R>) -> Result<Node> {
    let node = tri!(parser.parse());
    tri!(parser.end());
    Ok(node)
}

/// Parses a string of JSON text into a syntax tree.
///
/// # Errors
///
/// Fails if the text is not a single JSON value, allowing for trailing
/// commas, optionally surrounded by whitespace.
pub fn parse_str(s: &str) -> Result<Node> {
    parse_one(Parser::new(StrRead::new(s)))
}

/// Parses a slice of UTF-8 bytes into a syntax tree.
///
/// # Errors
///
/// Fails like [`parse_str`], and on invalid UTF-8.
pub fn parse_slice(v: &[u8]) -> Result<Node> {
    parse_one(Parser::new(SliceRead::new(v)))
}

/// Parses the whole content of an IO stream into a syntax tree.
///
/// The reader is consumed byte by byte; wrap unbuffered sources such as files
/// in a [`std::io::BufReader`].
///
/// # Errors
///
/// Fails like [`parse_slice`], and when the reader reports an error.
pub fn parse_reader<R>(rdr: R) -> Result<Node>
where
    R: io::Read,
{
    parse_one(Parser::new(IoRead::new(rdr)))
}

fn from_node<T>(node: Result<Node>) -> Result<T>
where
    T: Decode + Default,
{
    let node = tri!(node);
    let mut value = T::default();
    tri!(node.decode(&mut value));
    Ok(value)
}

/// Decodes an instance of type `T` from a string of JSON text, with default
/// options.
///
/// ```
/// let v: Vec<Option<u32>> = jtree::from_str("[1, null, 3,]").unwrap();
/// assert_eq!(v, [Some(1), None, Some(3)]);
/// ```
///
/// # Errors
///
/// Fails if the text does not parse or the tree does not fit `T`.
pub fn from_str<T>(s: &str) -> Result<T>
where
    T: Decode + Default,
{
    from_node(parse_str(s))
}

/// Decodes an instance of type `T` from bytes of JSON text, with default
/// options.
///
/// # Errors
///
/// Fails if the bytes do not parse or the tree does not fit `T`.
pub fn from_slice<T>(v: &[u8]) -> Result<T>
where
    T: Decode + Default,
{
    from_node(parse_slice(v))
}

/// Decodes an instance of type `T` from an IO stream of JSON, with default
/// options.
///
/// # Errors
///
/// Fails if the stream does not parse or the tree does not fit `T`.
pub fn from_reader<R, T>(rdr: R) -> Result<T>
where
    R: io::Read,
    T: Decode + Default,
{
    from_node(parse_reader(rdr))
}

/// Decodes a stream of concatenated JSON values, one per call to
/// [`decode`](Decoder::decode).
///
/// ```
/// use jtree::Decoder;
///
/// let mut dec = Decoder::from_str("1 [2, 3] 4");
/// let mut n = 0u8;
/// let mut v: Vec<u8> = Vec::new();
/// dec.decode(&mut n).unwrap();
/// dec.decode(&mut v).unwrap();
/// assert_eq!((n, v), (1, vec![2, 3]));
/// assert!(dec.more().unwrap());
/// dec.decode(&mut n).unwrap();
/// assert!(!dec.more().unwrap());
/// ```
pub struct Decoder<R> {
    parser: Parser<R>,
    options: Options,
}

impl<'a> Decoder<StrRead<'a>> {
    /// Creates a decoder reading from a `&str`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &'a str) -> Self {
        Decoder::new(Parser::from_str(s))
    }
}

impl<'a> Decoder<SliceRead<'a>> {
    /// Creates a decoder reading from a `&[u8]`.
    pub fn from_slice(v: &'a [u8]) -> Self {
        Decoder::new(Parser::from_slice(v))
    }
}

impl<R> Decoder<IoRead<R>>
where
    R: io::Read,
{
    /// Creates a decoder reading from an `io::Read`.
    pub fn from_reader(rdr: R) -> Self {
        Decoder::new(Parser::from_reader(rdr))
    }
}

impl<R: Read> Decoder<R> {
    /// Creates a decoder over a configured parser.
    pub fn new(parser: Parser<R>) -> Self {
        Decoder {
            parser,
            options: Options::new(),
        }
    }

    /// Makes unknown object keys an error for every following call.
    pub fn disallow_unknown_fields(&mut self) -> &mut Self {
        self.options = self.options.clone().disallow_unknown_fields();
        self
    }

    /// Replaces the options used for every following call.
    pub fn set_options(&mut self, options: Options) -> &mut Self {
        self.options = options;
        self
    }

    /// Returns true if another value follows in the input.
    ///
    /// # Errors
    ///
    /// Fails if the input cannot be read.
    pub fn more(&mut self) -> Result<bool> {
        self.parser.has_next()
    }

    /// Parses the next value and decodes it into `dest`.
    ///
    /// # Errors
    ///
    /// Fails at the end of the input, if the value does not parse, or if it
    /// does not fit `dest`. After a syntax error the position in the input is
    /// unspecified.
    pub fn decode<T>(&mut self, dest: &mut T) -> Result<()>
    where
        T: ?Sized + Decode,
    {
        let node = tri!(self.parser.parse());
        node.decode_with(dest, &self.options)
    }

    /// The character offset just past the last value parsed.
    pub fn offset(&self) -> usize {
        self.parser.offset()
    }

    /// Unwraps the underlying parser.
    pub fn into_inner(self) -> Parser<R> {
        self.parser
    }
}
