//! When parsing or decoding JSON goes wrong.

use std::error;
use std::fmt::{self, Debug, Display};
use std::io;
use std::result;

/// Boxed error produced by user hooks and encoding schemes.
pub type BoxError = Box<dyn error::Error + Send + Sync + 'static>;

/// This type represents all possible errors that can occur when parsing JSON
/// text into a [`Node`](crate::Node) or decoding a node into a destination.
pub struct Error {
    /// This `Box` allows us to keep the size of `Error` as small as possible. A
    /// larger `Error` type was substantially slower due to all the functions
    /// that pass around `Result<T, Error>`.
    err: Box<ErrorImpl>,
}

/// Alias for a `Result` with the error type `jtree::Error`.
pub type Result<T> = result::Result<T, Error>;

impl Error {
    /// Zero-based character offset at which the error was detected.
    ///
    /// Only lexical and syntax errors carry an offset; errors produced while
    /// decoding an already parsed tree return `None`.
    pub fn offset(&self) -> Option<usize> {
        self.err.offset
    }

    /// Specifies the cause of this error.
    pub fn code(&self) -> &ErrorCode {
        &self.err.code
    }

    /// Categorizes the cause of this error.
    ///
    /// - `Category::Io` - failure to read bytes from an IO stream
    /// - `Category::Lexical` - a character sequence that does not form a token
    /// - `Category::Syntax` - tokens that do not form a JSON value
    /// - `Category::Eof` - unexpected end of the input data
    /// - `Category::Data` - a node that cannot be converted to the destination,
    ///   or a tree nested deeper than the decoder's limit
    /// - `Category::Schema` - an object that does not fit the destination record
    /// - `Category::Extension` - a failure reported by a user hook or encoding
    pub fn classify(&self) -> Category {
        match self.err.code {
            ErrorCode::Io(_) => Category::Io,
            ErrorCode::UnexpectedCharacter(_)
            | ErrorCode::InvalidHexDigit(_)
            | ErrorCode::InvalidSurrogatePair
            | ErrorCode::InvalidUtf8 => Category::Lexical,
            ErrorCode::EofWhileParsingString
            | ErrorCode::EofWhileParsingValue
            | ErrorCode::EofWhileParsingList
            | ErrorCode::EofWhileParsingObject => Category::Eof,
            ErrorCode::UnexpectedToken(_)
            | ErrorCode::ObjectKeyExpected(_)
            | ErrorCode::ColonExpected(_)
            | ErrorCode::UndefinedKeyword(_)
            | ErrorCode::InvalidNumber(_)
            | ErrorCode::TrailingCharacters => Category::Syntax,
            // The parser's limit has a position, the decoder's does not.
            ErrorCode::RecursionLimitExceeded => match self.err.offset {
                Some(_) => Category::Syntax,
                None => Category::Data,
            },
            ErrorCode::CannotConvertNumber(_)
            | ErrorCode::CannotConvertString(_)
            | ErrorCode::CannotConvertBoolean(_)
            | ErrorCode::StructOrMapExpected(_)
            | ErrorCode::SequenceExpected(_)
            | ErrorCode::IncompatibleTypes(_, _)
            | ErrorCode::NumberOutOfRange(_)
            | ErrorCode::InvalidNumberText(_)
            | ErrorCode::InvalidBoolText(_) => Category::Data,
            ErrorCode::UndefinedField(_, _) => Category::Schema,
            ErrorCode::Encoding(_) | ErrorCode::Custom(_) => Category::Extension,
        }
    }

    /// Returns true if this error was caused by a failure to read bytes on an
    /// IO stream.
    pub fn is_io(&self) -> bool {
        self.classify() == Category::Io
    }

    /// Returns true if this error was caused by input that was not
    /// syntactically valid JSON, either at the character or the token level.
    pub fn is_syntax(&self) -> bool {
        matches!(self.classify(), Category::Lexical | Category::Syntax)
    }

    /// Returns true if this error was caused by prematurely reaching the end of
    /// the input data.
    ///
    /// Callers that process streaming input may be interested in retrying the
    /// parse once more data is available.
    pub fn is_eof(&self) -> bool {
        self.classify() == Category::Eof
    }

    /// Returns true if this error was caused by a node that could not be
    /// converted into the requested destination.
    pub fn is_data(&self) -> bool {
        matches!(self.classify(), Category::Data | Category::Schema)
    }

    /// Wraps an error reported by a user decode hook or type constructor.
    ///
    /// ```
    /// use jtree::{Decode, Error, Node, Options, Result};
    ///
    /// #[derive(Default)]
    /// struct Even(u32);
    ///
    /// impl Decode for Even {
    ///     fn decode_node(&mut self, node: &Node, opts: &Options) -> Result<()> {
    ///         let mut n = 0u32;
    ///         node.decode_with(&mut n, opts)?;
    ///         if n % 2 != 0 {
    ///             return Err(Error::custom(format!("{} is odd", n)));
    ///         }
    ///         self.0 = n;
    ///         Ok(())
    ///     }
    ///
    ///     fn set_null(&mut self) {
    ///         self.0 = 0;
    ///     }
    /// }
    /// ```
    #[cold]
    pub fn custom<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::data(ErrorCode::Custom(error.into()))
    }

    #[cold]
    pub(crate) fn at(code: ErrorCode, offset: usize) -> Self {
        Error {
            err: Box::new(ErrorImpl {
                code,
                offset: Some(offset),
            }),
        }
    }

    #[cold]
    pub(crate) fn data(code: ErrorCode) -> Self {
        Error {
            err: Box::new(ErrorImpl { code, offset: None }),
        }
    }

    #[cold]
    pub(crate) fn io(error: io::Error) -> Self {
        Error::data(ErrorCode::Io(error))
    }

    /// Attaches a position to an error raised by an input source, which only
    /// knows bytes, not character offsets.
    #[cold]
    pub(crate) fn fix_offset(mut self, offset: usize) -> Self {
        if self.err.offset.is_none() && !matches!(self.err.code, ErrorCode::Io(_)) {
            self.err.offset = Some(offset);
        }
        self
    }

    #[cold]
    pub(crate) fn encoding<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Error::data(ErrorCode::Encoding(error.into()))
    }
}

/// Categorizes the cause of a `jtree::Error`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Category {
    /// The error was caused by a failure to read bytes from an IO stream.
    Io,

    /// The input contains a character or escape sequence that does not
    /// belong to any token.
    Lexical,

    /// The tokens do not form a JSON value.
    Syntax,

    /// The error was caused by prematurely reaching the end of the input data.
    Eof,

    /// A node could not be converted into the destination type.
    Data,

    /// An object key does not match any field of the destination record.
    Schema,

    /// A user decode hook, type constructor or encoding scheme failed.
    Extension,
}

impl From<Error> for io::Error {
    /// Convert a `jtree::Error` into an `io::Error`.
    ///
    /// EOF errors are turned into `UnexpectedEof` IO errors, everything else
    /// becomes an `InvalidData` IO error.
    fn from(j: Error) -> Self {
        if let ErrorCode::Io(err) = j.err.code {
            err
        } else {
            match j.classify() {
                Category::Eof => io::Error::new(io::ErrorKind::UnexpectedEof, j),
                _ => io::Error::new(io::ErrorKind::InvalidData, j),
            }
        }
    }
}

struct ErrorImpl {
    code: ErrorCode,
    offset: Option<usize>,
}

/// This type describes all possible errors that can occur when parsing or
/// decoding JSON.
pub enum ErrorCode {
    /// Some IO error occurred while reading the input.
    Io(io::Error),

    /// A character that cannot start a token.
    UnexpectedCharacter(char),

    /// A non hexadecimal character inside a `\x` or `\u` escape.
    InvalidHexDigit(char),

    /// A UTF-16 surrogate escape without its counterpart.
    InvalidSurrogatePair,

    /// The input bytes are not valid UTF-8.
    InvalidUtf8,

    /// EOF while parsing a string.
    EofWhileParsingString,

    /// EOF while parsing a JSON value.
    EofWhileParsingValue,

    /// EOF while parsing an array.
    EofWhileParsingList,

    /// EOF while parsing an object.
    EofWhileParsingObject,

    /// A token which is not allowed at this place.
    UnexpectedToken(Box<str>),

    /// Expected a string key inside an object.
    ObjectKeyExpected(Box<str>),

    /// Expected a `':'` after an object key.
    ColonExpected(Box<str>),

    /// A bare word other than `true`, `false` or `null`.
    UndefinedKeyword(Box<str>),

    /// A number literal which is not a valid decimal number.
    InvalidNumber(Box<str>),

    /// Non-whitespace characters after a complete document.
    TrailingCharacters,

    /// Encountered nesting of JSON objects and arrays deeper than the limit.
    RecursionLimitExceeded,

    /// A number node cannot be converted into the named type.
    CannotConvertNumber(&'static str),

    /// A string node cannot be converted into the named type.
    CannotConvertString(&'static str),

    /// A boolean node cannot be converted into the named type.
    CannotConvertBoolean(&'static str),

    /// An object node was decoded into something other than a record or map.
    StructOrMapExpected(&'static str),

    /// An array node was decoded into something other than a sequence.
    SequenceExpected(&'static str),

    /// A default value of the first type cannot be stored as the second type.
    IncompatibleTypes(&'static str, &'static str),

    /// Numeric text does not fit into the named type.
    NumberOutOfRange(&'static str),

    /// Malformed numeric text in string mode.
    InvalidNumberText(Box<str>),

    /// Text other than `true` or `false` decoded into a boolean in string mode.
    InvalidBoolText(Box<str>),

    /// An object key without a matching record field while unknown fields are
    /// disallowed.
    UndefinedField(Box<str>, &'static str),

    /// The binary encoding scheme rejected its input.
    Encoding(BoxError),

    /// Failure reported by a user decode hook or type constructor.
    Custom(BoxError),
}

impl Debug for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::Io(_) => f.debug_tuple("Io").finish(),
            ErrorCode::Encoding(err) => f.debug_tuple("Encoding").field(err).finish(),
            ErrorCode::Custom(err) => f.debug_tuple("Custom").field(err).finish(),
            error_code => f.write_str(&error_code.to_string()),
        }
    }
}

impl PartialEq for ErrorCode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ErrorCode::UnexpectedCharacter(l), ErrorCode::UnexpectedCharacter(r))
            | (ErrorCode::InvalidHexDigit(l), ErrorCode::InvalidHexDigit(r)) => l == r,
            (ErrorCode::UnexpectedToken(l), ErrorCode::UnexpectedToken(r))
            | (ErrorCode::ObjectKeyExpected(l), ErrorCode::ObjectKeyExpected(r))
            | (ErrorCode::ColonExpected(l), ErrorCode::ColonExpected(r))
            | (ErrorCode::UndefinedKeyword(l), ErrorCode::UndefinedKeyword(r))
            | (ErrorCode::InvalidNumber(l), ErrorCode::InvalidNumber(r))
            | (ErrorCode::InvalidNumberText(l), ErrorCode::InvalidNumberText(r))
            | (ErrorCode::InvalidBoolText(l), ErrorCode::InvalidBoolText(r)) => l == r,
            (ErrorCode::CannotConvertNumber(l), ErrorCode::CannotConvertNumber(r))
            | (ErrorCode::CannotConvertString(l), ErrorCode::CannotConvertString(r))
            | (ErrorCode::CannotConvertBoolean(l), ErrorCode::CannotConvertBoolean(r))
            | (ErrorCode::StructOrMapExpected(l), ErrorCode::StructOrMapExpected(r))
            | (ErrorCode::SequenceExpected(l), ErrorCode::SequenceExpected(r))
            | (ErrorCode::NumberOutOfRange(l), ErrorCode::NumberOutOfRange(r)) => l == r,
            (ErrorCode::IncompatibleTypes(l0, l1), ErrorCode::IncompatibleTypes(r0, r1)) => {
                l0 == r0 && l1 == r1
            }
            (ErrorCode::UndefinedField(l0, l1), ErrorCode::UndefinedField(r0, r1)) => {
                l0 == r0 && l1 == r1
            }
            (ErrorCode::Encoding(l), ErrorCode::Encoding(r))
            | (ErrorCode::Custom(l), ErrorCode::Custom(r)) => l.to_string() == r.to_string(),
            (ErrorCode::Io(_), ErrorCode::Io(_)) => true,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorCode::Io(err) => Display::fmt(err, f),
            ErrorCode::UnexpectedCharacter(c) => write!(f, "unexpected character {:?}", c),
            ErrorCode::InvalidHexDigit(c) => write!(f, "invalid hexadecimal digit {:?}", c),
            ErrorCode::InvalidSurrogatePair => f.write_str("invalid UTF-16 surrogate pair"),
            ErrorCode::InvalidUtf8 => f.write_str("invalid UTF-8"),
            ErrorCode::EofWhileParsingString => f.write_str("EOF while parsing a string"),
            ErrorCode::EofWhileParsingValue => f.write_str("EOF while parsing a value"),
            ErrorCode::EofWhileParsingList => f.write_str("EOF while parsing an array"),
            ErrorCode::EofWhileParsingObject => f.write_str("EOF while parsing an object"),
            ErrorCode::UnexpectedToken(tok) => write!(f, "unexpected token `{}`", tok),
            ErrorCode::ObjectKeyExpected(tok) => write!(f, "object key expected: `{}`", tok),
            ErrorCode::ColonExpected(tok) => write!(f, "colon expected: `{}`", tok),
            ErrorCode::UndefinedKeyword(word) => write!(f, "undefined keyword `{}`", word),
            ErrorCode::InvalidNumber(text) => write!(f, "invalid number `{}`", text),
            ErrorCode::TrailingCharacters => f.write_str("trailing characters"),
            ErrorCode::RecursionLimitExceeded => f.write_str("recursion limit exceeded"),
            ErrorCode::CannotConvertNumber(ty) => write!(f, "can't convert number to {}", ty),
            ErrorCode::CannotConvertString(ty) => write!(f, "can't convert string to {}", ty),
            ErrorCode::CannotConvertBoolean(ty) => write!(f, "can't convert boolean to {}", ty),
            ErrorCode::StructOrMapExpected(ty) => write!(f, "struct or map expected: {}", ty),
            ErrorCode::SequenceExpected(ty) => write!(f, "sequence expected: {}", ty),
            ErrorCode::IncompatibleTypes(from, to) => write!(f, "can't convert {} to {}", from, to),
            ErrorCode::NumberOutOfRange(ty) => write!(f, "number out of range for {}", ty),
            ErrorCode::InvalidNumberText(text) => write!(f, "invalid number syntax: {:?}", text),
            ErrorCode::InvalidBoolText(text) => write!(f, "invalid boolean syntax: {:?}", text),
            ErrorCode::UndefinedField(field, ty) => {
                write!(f, "undefined field `{}`: {}", field, ty)
            }
            ErrorCode::Encoding(err) => Display::fmt(err, f),
            ErrorCode::Custom(err) => Display::fmt(err, f),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match &self.err.code {
            ErrorCode::Io(err) => Some(err),
            ErrorCode::Encoding(err) | ErrorCode::Custom(err) => Some(&**err),
            _ => None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&*self.err, f)
    }
}

impl Display for ErrorImpl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.offset {
            Some(offset) => write!(f, "{} at position {}", self.code, offset),
            None => Display::fmt(&self.code, f),
        }
    }
}

// Remove two layers of verbosity from the debug representation. Humans often
// end up seeing this representation because it is what unwrap() shows.
impl Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.err.offset {
            Some(offset) => write!(
                f,
                "Error({:?}, offset: {})",
                self.err.code.to_string(),
                offset
            ),
            None => write!(f, "Error({:?})", self.err.code.to_string()),
        }
    }
}
