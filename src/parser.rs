//! Recursive descent from tokens to a [`Node`].

use crate::error::{Error, ErrorCode, Result};
use crate::node::{Node, Object};
use crate::number::Number;
use crate::read::{IoRead, Read, SliceRead, StrRead};
use crate::token::{Token, Tokenizer};
use std::io;

/// A structure that parses JSON text into syntax trees, one top-level value
/// per call to [`parse`](Parser::parse).
///
/// Besides plain JSON the parser accepts a single trailing comma before the
/// closing `]` or `}` of a container.
pub struct Parser<R> {
    tokenizer: Tokenizer<R>,
    remaining_depth: u8,
    #[cfg(feature = "unbounded_depth")]
    disable_recursion_limit: bool,
}

impl<'a> Parser<StrRead<'a>> {
    /// Creates a JSON parser from a `&str`.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &'a str) -> Self {
        Parser::new(StrRead::new(s))
    }
}

impl<'a> Parser<SliceRead<'a>> {
    /// Creates a JSON parser from a `&[u8]` holding UTF-8 text.
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Parser::new(SliceRead::new(bytes))
    }
}

impl<R> Parser<IoRead<R>>
where
    R: io::Read,
{
    /// Creates a JSON parser from an `io::Read`.
    ///
    /// Reader-based parsers do not support parsing borrowed types like `&str`,
    /// since the input is consumed byte by byte.
    pub fn from_reader(reader: R) -> Self {
        Parser::new(IoRead::new(reader))
    }
}

impl<R: Read> Parser<R> {
    /// Create a JSON parser from one of the possible jtree input sources.
    ///
    /// Typically it is more convenient to use one of these methods instead:
    ///
    ///   - Parser::from_str
    ///   - Parser::from_slice
    ///   - Parser::from_reader
    pub fn new(read: R) -> Self {
        Parser {
            tokenizer: Tokenizer::new(read),
            remaining_depth: 128,
            #[cfg(feature = "unbounded_depth")]
            disable_recursion_limit: false,
        }
    }

    /// Sets the maximum nesting depth of arrays and objects. A limit of `n`
    /// admits up to `n - 1` levels of nesting. The default is 128.
    pub fn set_recursion_limit(&mut self, limit: u8) -> &mut Self {
        self.remaining_depth = limit;
        self
    }

    /// Parse arbitrarily deep JSON structures without any consideration for
    /// overflowing the stack.
    ///
    /// You will want to provide some other way to protect against stack
    /// overflows, such as by wrapping your parser in a thread with a larger
    /// stack or by running it on the heap-allocated stack of a crate like
    /// `stacker`.
    ///
    /// This method is only available if jtree is built with the
    /// `"unbounded_depth"` feature.
    #[cfg(feature = "unbounded_depth")]
    pub fn disable_recursion_limit(&mut self) {
        self.disable_recursion_limit = true;
    }

    /// Number of characters consumed so far.
    pub fn offset(&self) -> usize {
        self.tokenizer.offset()
    }

    /// Parses exactly one JSON value.
    ///
    /// Anything following the value is left in the input for the next call.
    pub fn parse(&mut self) -> Result<Node> {
        match tri!(self.tokenizer.next_token()) {
            Some(tok) => self.parse_value(tok),
            None => Err(Error::at(
                ErrorCode::EofWhileParsingValue,
                self.tokenizer.offset(),
            )),
        }
    }

    /// The `Parser::end` method should be called after a value has been fully
    /// parsed. This allows the `Parser` to validate that the input stream is
    /// at the end or that it only has trailing whitespace.
    pub fn end(&mut self) -> Result<()> {
        match tri!(self.tokenizer.peek_non_space()) {
            Some(_) => Err(Error::at(
                ErrorCode::TrailingCharacters,
                self.tokenizer.offset(),
            )),
            None => Ok(()),
        }
    }

    /// Returns true if anything but whitespace is left in the input.
    pub fn has_next(&mut self) -> Result<bool> {
        Ok(tri!(self.tokenizer.peek_non_space()).is_some())
    }

    fn parse_value(&mut self, tok: Token) -> Result<Node> {
        match tok {
            Token::String { text, .. } => Ok(Node::String(text)),
            Token::Number { text, offset } => match text.parse::<Number>() {
                Ok(n) => Ok(Node::Number(n)),
                Err(_) => Err(Error::at(ErrorCode::InvalidNumber(text.into()), offset)),
            },
            Token::Keyword { text, offset } => match text.as_str() {
                "true" => Ok(Node::Bool(true)),
                "false" => Ok(Node::Bool(false)),
                "null" => Ok(Node::Null),
                _ => Err(Error::at(ErrorCode::UndefinedKeyword(text.into()), offset)),
            },
            Token::Delimiter { ch: '[', offset } => {
                tri!(self.enter(offset));
                let ret = self.parse_array();
                self.leave();
                ret
            }
            Token::Delimiter { ch: '{', offset } => {
                tri!(self.enter(offset));
                let ret = self.parse_object();
                self.leave();
                ret
            }
            tok @ Token::Delimiter { .. } => Err(unexpected(&tok)),
        }
    }

    fn enter(&mut self, offset: usize) -> Result<()> {
        #[cfg(feature = "unbounded_depth")]
        if self.disable_recursion_limit {
            return Ok(());
        }
        match self.remaining_depth.checked_sub(1) {
            Some(depth) if depth > 0 => {
                self.remaining_depth = depth;
                Ok(())
            }
            _ => Err(Error::at(ErrorCode::RecursionLimitExceeded, offset)),
        }
    }

    fn leave(&mut self) {
        #[cfg(feature = "unbounded_depth")]
        if self.disable_recursion_limit {
            return;
        }
        self.remaining_depth += 1;
    }

    fn next_token(&mut self, eof: ErrorCode) -> Result<Token> {
        match tri!(self.tokenizer.next_token()) {
            Some(tok) => Ok(tok),
            None => Err(Error::at(eof, self.tokenizer.offset())),
        }
    }

    /// Assumes the `[` was consumed.
    fn parse_array(&mut self) -> Result<Node> {
        let mut array = Vec::new();
        loop {
            // A value or the closing bracket.
            let tok = tri!(self.next_token(ErrorCode::EofWhileParsingList));
            if tok.is_delimiter(']') {
                break;
            }
            array.push(tri!(self.parse_value(tok)));

            // A separator or the closing bracket.
            let tok = tri!(self.next_token(ErrorCode::EofWhileParsingList));
            if tok.is_delimiter(']') {
                break;
            }
            if !tok.is_delimiter(',') {
                return Err(unexpected(&tok));
            }
        }
        Ok(Node::Array(array))
    }

    /// Assumes the `{` was consumed.
    fn parse_object(&mut self) -> Result<Node> {
        let mut object = Object::new();
        loop {
            let key = match tri!(self.next_token(ErrorCode::EofWhileParsingObject)) {
                Token::String { text, .. } => text,
                tok if tok.is_delimiter('}') => break,
                tok @ Token::Delimiter { .. } => return Err(unexpected(&tok)),
                tok => {
                    return Err(Error::at(
                        ErrorCode::ObjectKeyExpected(tok.to_string().into()),
                        tok.offset(),
                    ))
                }
            };

            let tok = tri!(self.next_token(ErrorCode::EofWhileParsingObject));
            if !tok.is_delimiter(':') {
                return Err(Error::at(
                    ErrorCode::ColonExpected(tok.to_string().into()),
                    tok.offset(),
                ));
            }

            let tok = tri!(self.next_token(ErrorCode::EofWhileParsingObject));
            let value = tri!(self.parse_value(tok));
            // A repeated key keeps its first position and takes the new value.
            object.insert(key, value);

            let tok = tri!(self.next_token(ErrorCode::EofWhileParsingObject));
            if tok.is_delimiter('}') {
                break;
            }
            if !tok.is_delimiter(',') {
                return Err(unexpected(&tok));
            }
        }
        Ok(Node::Object(object))
    }
}

fn unexpected(tok: &Token) -> Error {
    Error::at(
        ErrorCode::UnexpectedToken(tok.to_string().into()),
        tok.offset(),
    )
}

/// Yields one node per top-level value until the input holds nothing but
/// whitespace.
impl<R: Read> Iterator for Parser<R> {
    type Item = Result<Node>;

    fn next(&mut self) -> Option<Result<Node>> {
        match self.has_next() {
            Ok(true) => Some(self.parse()),
            Ok(false) => None,
            Err(err) => Some(Err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Node> {
        Parser::from_str(s).parse()
    }

    #[test]
    fn depth_is_restored_after_each_container() {
        let mut parser = Parser::from_str("[[]] [[]]");
        parser.set_recursion_limit(3);
        assert!(parser.parse().is_ok());
        assert!(parser.parse().is_ok());
        assert_eq!(parser.remaining_depth, 3);
    }

    #[test]
    fn delimiter_in_value_position() {
        let err = parse("[1,,]").unwrap_err();
        assert_eq!(*err.code(), ErrorCode::UnexpectedToken(",".into()));
        assert_eq!(err.offset(), Some(3));

        let err = parse("}").unwrap_err();
        assert_eq!(*err.code(), ErrorCode::UnexpectedToken("}".into()));
    }
}
