//! Splitting a character stream into positioned tokens.

use crate::error::{Error, ErrorCode, Result};
use crate::read::Read;
use std::fmt::{self, Display};

/// A lexical unit of JSON text together with the character offset at which it
/// starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    /// One of `{ } [ ] , :`.
    Delimiter {
        /// The delimiter character.
        ch: char,
        /// Offset of the delimiter.
        offset: usize,
    },
    /// A string literal with every escape sequence already expanded.
    String {
        /// Unescaped contents, without the quotes.
        text: String,
        /// Offset of the opening quote.
        offset: usize,
    },
    /// The raw text of a number literal. It is validated by the parser.
    Number {
        /// Literal text as it appears in the input.
        text: String,
        /// Offset of the first character.
        offset: usize,
    },
    /// A run of lowercase letters. Only `true`, `false` and `null` are
    /// accepted by the parser.
    Keyword {
        /// The letters read.
        text: String,
        /// Offset of the first letter.
        offset: usize,
    },
}

impl Token {
    /// Character offset of the first character of the token.
    pub fn offset(&self) -> usize {
        match *self {
            Token::Delimiter { offset, .. }
            | Token::String { offset, .. }
            | Token::Number { offset, .. }
            | Token::Keyword { offset, .. } => offset,
        }
    }

    /// Returns true if the token is the given delimiter.
    pub fn is_delimiter(&self, expected: char) -> bool {
        matches!(*self, Token::Delimiter { ch, .. } if ch == expected)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Delimiter { ch, .. } => write!(f, "{}", ch),
            Token::String { text, .. } => write!(f, "{:?}", text),
            Token::Number { text, .. } | Token::Keyword { text, .. } => f.write_str(text),
        }
    }
}

/// Produces tokens lazily from a [`Read`] source.
///
/// The tokenizer never looks more than one character ahead; the character
/// that terminates a number or a keyword is pushed back and becomes the start
/// of the next token.
pub struct Tokenizer<R> {
    read: R,
    pushback: Option<char>,
    /// Number of characters consumed so far.
    offset: usize,
}

fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_number_char(c: char) -> bool {
    matches!(c, '0'..='9' | '+' | '-' | '.' | 'e' | 'E')
}

impl<R: Read> Tokenizer<R> {
    /// Creates a tokenizer reading from `read`.
    pub fn new(read: R) -> Self {
        Tokenizer {
            read,
            pushback: None,
            offset: 0,
        }
    }

    /// Offset of the next character to be read.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn next_char(&mut self) -> Result<Option<char>> {
        let ch = match self.pushback.take() {
            Some(ch) => Some(ch),
            None => {
                let offset = self.offset;
                tri!(self.read.next().map_err(|err| err.fix_offset(offset)))
            }
        };
        if ch.is_some() {
            self.offset += 1;
        }
        Ok(ch)
    }

    fn unread(&mut self, ch: char) {
        self.pushback = Some(ch);
        self.offset -= 1;
    }

    /// Skips whitespace and returns the next non-whitespace character without
    /// consuming it, or `None` at the end of the input.
    pub fn peek_non_space(&mut self) -> Result<Option<char>> {
        loop {
            match tri!(self.next_char()) {
                Some(c) if is_space(c) => continue,
                Some(c) => {
                    self.unread(c);
                    return Ok(Some(c));
                }
                None => return Ok(None),
            }
        }
    }

    /// Returns the next token, `Ok(None)` once the input is exhausted.
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        let c = loop {
            match tri!(self.next_char()) {
                Some(c) if is_space(c) => continue,
                Some(c) => break c,
                None => return Ok(None),
            }
        };
        let offset = self.offset - 1;

        let token = match c {
            '0'..='9' | '-' | '.' => Token::Number {
                text: tri!(self.scan_while(c, is_number_char)),
                offset,
            },
            '"' => Token::String {
                text: tri!(self.scan_string()),
                offset,
            },
            '{' | '}' | '[' | ']' | ',' | ':' => Token::Delimiter { ch: c, offset },
            'a'..='z' => Token::Keyword {
                text: tri!(self.scan_while(c, |c| c.is_ascii_lowercase())),
                offset,
            },
            _ => return Err(Error::at(ErrorCode::UnexpectedCharacter(c), offset)),
        };
        Ok(Some(token))
    }

    fn scan_while(&mut self, first: char, accept: fn(char) -> bool) -> Result<String> {
        let mut text = String::new();
        text.push(first);
        while let Some(c) = tri!(self.next_char()) {
            if !accept(c) {
                self.unread(c);
                break;
            }
            text.push(c);
        }
        Ok(text)
    }

    fn next_in_string(&mut self) -> Result<char> {
        match tri!(self.next_char()) {
            Some(c) => Ok(c),
            None => Err(Error::at(ErrorCode::EofWhileParsingString, self.offset)),
        }
    }

    /// Assumes the opening quotation mark was consumed.
    fn scan_string(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            if self.pushback.is_none() {
                self.offset += tri!(self.read.scan_plain(&mut out));
            }
            match tri!(self.next_in_string()) {
                '"' => return Ok(out),
                '\\' => tri!(self.scan_escape(&mut out)),
                c => out.push(c),
            }
        }
    }

    /// Assumes the backslash was consumed.
    fn scan_escape(&mut self, out: &mut String) -> Result<()> {
        match tri!(self.next_in_string()) {
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'x' => {
                let code = tri!(self.scan_hex(2));
                out.push(char::from(code as u8));
            }
            'u' => {
                let offset = self.offset - 2;
                let code = tri!(self.scan_utf16(offset));
                out.push(code);
            }
            // `\"`, `\\`, `\/` and unknown escapes stand for the character itself.
            c => out.push(c),
        }
        Ok(())
    }

    /// Assumes `\u` was consumed; `offset` points at the backslash.
    fn scan_utf16(&mut self, offset: usize) -> Result<char> {
        let unit = tri!(self.scan_hex(4));
        match unit {
            0xD800..=0xDBFF => {
                if tri!(self.next_in_string()) != '\\' || tri!(self.next_in_string()) != 'u' {
                    return Err(Error::at(ErrorCode::InvalidSurrogatePair, offset));
                }
                let low = tri!(self.scan_hex(4));
                if !(0xDC00..=0xDFFF).contains(&low) {
                    return Err(Error::at(ErrorCode::InvalidSurrogatePair, offset));
                }
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                char::from_u32(code).ok_or_else(|| Error::at(ErrorCode::InvalidSurrogatePair, offset))
            }
            0xDC00..=0xDFFF => Err(Error::at(ErrorCode::InvalidSurrogatePair, offset)),
            // Every other BMP code unit is a scalar value.
            _ => char::from_u32(unit).ok_or_else(|| Error::at(ErrorCode::InvalidSurrogatePair, offset)),
        }
    }

    fn scan_hex(&mut self, digits: usize) -> Result<u32> {
        let mut code = 0;
        for _ in 0..digits {
            let c = tri!(self.next_in_string());
            match c.to_digit(16) {
                Some(d) => code = code << 4 | d,
                None => return Err(Error::at(ErrorCode::InvalidHexDigit(c), self.offset - 1)),
            }
        }
        Ok(code)
    }
}
