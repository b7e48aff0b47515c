use crate::error::{Error, ErrorCode, Result};
use std::io;
use std::str;

/// Trait used by the tokenizer for iterating over input characters. This is
/// implemented for in-memory text, in-memory bytes and `std::io` streams.
///
/// This trait is sealed and cannot be implemented for types outside of
/// `jtree`.
pub trait Read: private::Sealed {
    /// Returns the next character, or `None` at the end of the input.
    #[doc(hidden)]
    fn next(&mut self) -> Result<Option<char>>;

    /// Appends the run of characters up to (not including) the next `"` or
    /// `\` to `out` and returns the number of characters appended.
    ///
    /// Sources that cannot do better than character-at-a-time reading return
    /// zero and let the tokenizer fall back to `next`.
    #[doc(hidden)]
    fn scan_plain(&mut self, out: &mut String) -> Result<usize> {
        let _ = out;
        Ok(0)
    }
}

/// JSON input source that reads from a UTF-8 string.
pub struct StrRead<'a> {
    rest: &'a str,
}

/// JSON input source that reads from a slice of bytes.
//
// UTF-8 validation happens lazily, one character at a time, so an invalid
// sequence is reported at the position where it appears.
pub struct SliceRead<'a> {
    slice: &'a [u8],
    index: usize,
}

/// JSON input source that reads from a std::io input stream.
///
/// When reading from a source against which short reads are not efficient,
/// such as a [`File`], you will want to apply your own buffering because jtree
/// will not buffer the input. See [`std::io::BufReader`].
///
/// [`File`]: std::fs::File
pub struct IoRead<R>
where
    R: io::Read,
{
    bytes: io::Bytes<R>,
}

// Prevent users from implementing the Read trait.
mod private {
    pub trait Sealed {}
}

//////////////////////////////////////////////////////////////////////////////

impl<'a> StrRead<'a> {
    /// Create a JSON input source to read from a UTF-8 string.
    pub fn new(s: &'a str) -> Self {
        StrRead { rest: s }
    }
}

impl<'a> private::Sealed for StrRead<'a> {}

impl<'a> Read for StrRead<'a> {
    #[inline]
    fn next(&mut self) -> Result<Option<char>> {
        let mut chars = self.rest.chars();
        let ch = chars.next();
        self.rest = chars.as_str();
        Ok(ch)
    }

    fn scan_plain(&mut self, out: &mut String) -> Result<usize> {
        // Both delimiters are ASCII so the match is always a char boundary.
        let end = memchr::memchr2(b'"', b'\\', self.rest.as_bytes()).unwrap_or(self.rest.len());
        let (chunk, rest) = self.rest.split_at(end);
        out.push_str(chunk);
        self.rest = rest;
        Ok(chunk.chars().count())
    }
}

//////////////////////////////////////////////////////////////////////////////

impl<'a> SliceRead<'a> {
    /// Create a JSON input source to read from a slice of bytes.
    pub fn new(slice: &'a [u8]) -> Self {
        SliceRead { slice, index: 0 }
    }
}

impl<'a> private::Sealed for SliceRead<'a> {}

impl<'a> Read for SliceRead<'a> {
    fn next(&mut self) -> Result<Option<char>> {
        let rest = &self.slice[self.index..];
        let first = match rest.first() {
            Some(&b) => b,
            None => return Ok(None),
        };
        let width = utf8_width(first);
        if width == 0 || rest.len() < width {
            return Err(Error::data(ErrorCode::InvalidUtf8));
        }
        match str::from_utf8(&rest[..width]) {
            Ok(s) => {
                self.index += width;
                Ok(s.chars().next())
            }
            Err(_) => Err(Error::data(ErrorCode::InvalidUtf8)),
        }
    }

    fn scan_plain(&mut self, out: &mut String) -> Result<usize> {
        let rest = &self.slice[self.index..];
        let end = memchr::memchr2(b'"', b'\\', rest).unwrap_or(rest.len());
        // Copy the valid prefix only; `next` reports the bad sequence with
        // its exact position.
        let chunk = match str::from_utf8(&rest[..end]) {
            Ok(chunk) => chunk,
            Err(err) => match str::from_utf8(&rest[..err.valid_up_to()]) {
                Ok(chunk) => chunk,
                Err(_) => return Ok(0),
            },
        };
        out.push_str(chunk);
        self.index += chunk.len();
        Ok(chunk.chars().count())
    }
}

//////////////////////////////////////////////////////////////////////////////

impl<R> IoRead<R>
where
    R: io::Read,
{
    /// Create a JSON input source to read from a std::io input stream.
    pub fn new(reader: R) -> Self {
        IoRead {
            bytes: reader.bytes(),
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>> {
        match self.bytes.next() {
            Some(Ok(b)) => Ok(Some(b)),
            Some(Err(err)) => Err(Error::io(err)),
            None => Ok(None),
        }
    }
}

impl<R> private::Sealed for IoRead<R> where R: io::Read {}

impl<R> Read for IoRead<R>
where
    R: io::Read,
{
    fn next(&mut self) -> Result<Option<char>> {
        let first = match tri!(self.next_byte()) {
            Some(b) => b,
            None => return Ok(None),
        };
        let width = utf8_width(first);
        if width == 0 {
            return Err(Error::data(ErrorCode::InvalidUtf8));
        }
        let mut buf = [first, 0, 0, 0];
        for slot in &mut buf[1..width] {
            match tri!(self.next_byte()) {
                Some(b) => *slot = b,
                None => return Err(Error::data(ErrorCode::InvalidUtf8)),
            }
        }
        match str::from_utf8(&buf[..width]) {
            Ok(s) => Ok(s.chars().next()),
            Err(_) => Err(Error::data(ErrorCode::InvalidUtf8)),
        }
    }
}

/// Length of the UTF-8 sequence introduced by `first`, zero if `first` can't
/// start one.
fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain<R: Read>(mut read: R) -> Result<String> {
        let mut out = String::new();
        while let Some(ch) = read.next()? {
            out.push(ch);
        }
        Ok(out)
    }

    #[test]
    fn sources_agree() {
        let text = "{\"a\":\"привет 𝄞\"}";
        assert_eq!(drain(StrRead::new(text)).unwrap(), text);
        assert_eq!(drain(SliceRead::new(text.as_bytes())).unwrap(), text);
        assert_eq!(drain(IoRead::new(text.as_bytes())).unwrap(), text);
    }

    #[test]
    fn invalid_utf8() {
        let err = drain(SliceRead::new(b"ab\xffcd")).unwrap_err();
        assert_eq!(*err.code(), ErrorCode::InvalidUtf8);
        let err = drain(IoRead::new(&b"ab\xe2\x82"[..])).unwrap_err();
        assert_eq!(*err.code(), ErrorCode::InvalidUtf8);
    }

    #[test]
    fn scan_stops_at_quote_or_escape() {
        let mut read = StrRead::new("héllo\\n\"");
        let mut out = String::new();
        assert_eq!(read.scan_plain(&mut out).unwrap(), 5);
        assert_eq!(out, "héllo");
        assert_eq!(read.next().unwrap(), Some('\\'));

        let mut read = SliceRead::new("tail\"".as_bytes());
        let mut out = String::new();
        assert_eq!(read.scan_plain(&mut out).unwrap(), 4);
        assert_eq!(read.next().unwrap(), Some('"'));
    }
}
