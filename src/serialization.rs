use std::fmt::Display;
use std::io::{ErrorKind, Read, Write};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Serialize a type to a binary byte stream.
///
/// The wire format is type-specific and documented on each implementor.
/// All multi-byte integers are written in little-endian order.
pub trait WriterTo {
    /// Writes the complete serialized representation to `writer`.
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<()>;
}

/// Deserialize a type from a binary byte stream.
///
/// Payloads are validated before any value is returned, so a failed read
/// never yields a half-constructed object.
pub trait ReaderFrom: Sized {
    /// Reads one value from `reader`.
    fn read_from<R: Read>(reader: &mut R) -> Result<Self>;
}

/// Incremental tokenizer for the bracketed ASCII framing.
///
/// Reads one byte at a time with a single byte of pushback, so parsing
/// consumes exactly one framed value and leaves the stream positioned
/// after its closing bracket.
pub(crate) struct AsciiReader<'a, R: Read> {
    inner: &'a mut R,
    peeked: Option<u8>,
}

impl<'a, R: Read> AsciiReader<'a, R> {
    pub fn new(inner: &'a mut R) -> Self {
        Self { inner, peeked: None }
    }

    fn read_byte(&mut self) -> Result<Option<u8>> {
        if let Some(b) = self.peeked.take() {
            return Ok(Some(b));
        }
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Returns the next non-whitespace byte without consuming it.
    fn peek_nonws(&mut self) -> Result<Option<u8>> {
        loop {
            match self.read_byte()? {
                Some(b) if b.is_ascii_whitespace() => continue,
                Some(b) => {
                    self.peeked = Some(b);
                    return Ok(Some(b));
                }
                None => return Ok(None),
            }
        }
    }

    /// Consumes whitespace and then the expected framing character.
    pub fn seek_past_char(&mut self, want: u8) -> Result<()> {
        match self.peek_nonws()? {
            Some(b) if b == want => {
                self.peeked = None;
                Ok(())
            }
            Some(b) => Err(Error::MalformedStream(format!(
                "expected '{}', found '{}'",
                want as char, b as char
            ))),
            None => Err(Error::MalformedStream(format!(
                "expected '{}', found end of stream",
                want as char
            ))),
        }
    }

    /// Whether the next non-whitespace byte equals `want` (not consumed).
    pub fn peek_is(&mut self, want: u8) -> Result<bool> {
        Ok(self.peek_nonws()? == Some(want))
    }

    /// Reads one whitespace-delimited token. Brackets terminate a token
    /// and stay in the stream.
    pub fn token(&mut self) -> Result<String> {
        let mut tok = String::new();
        if self.peek_nonws()?.is_none() {
            return Err(Error::MalformedStream(
                "expected a token, found end of stream".into(),
            ));
        }
        while let Some(b) = self.read_byte()? {
            if b.is_ascii_whitespace() {
                break;
            }
            if b == b'[' || b == b']' {
                self.peeked = Some(b);
                break;
            }
            tok.push(b as char);
        }
        if tok.is_empty() {
            return Err(Error::MalformedStream("expected a token".into()));
        }
        Ok(tok)
    }

    /// Reads one token and parses it.
    pub fn parse<T: FromStr>(&mut self) -> Result<T>
    where
        T::Err: Display,
    {
        let tok = self.token()?;
        tok.parse()
            .map_err(|e| Error::MalformedStream(format!("invalid token '{tok}': {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizer_splits_on_brackets_and_whitespace() {
        let data = b"[3  1.5[0 2]]tail";
        let mut cursor = &data[..];
        let mut r = AsciiReader::new(&mut cursor);
        r.seek_past_char(b'[').unwrap();
        assert_eq!(r.parse::<usize>().unwrap(), 3);
        assert_eq!(r.parse::<f64>().unwrap(), 1.5);
        r.seek_past_char(b'[').unwrap();
        assert_eq!(r.parse::<usize>().unwrap(), 0);
        assert_eq!(r.parse::<usize>().unwrap(), 2);
        assert!(r.peek_is(b']').unwrap());
        r.seek_past_char(b']').unwrap();
        r.seek_past_char(b']').unwrap();
        // the trailing bytes stay in the stream
        assert_eq!(cursor, b"tail" as &[u8]);
    }

    #[test]
    fn missing_framing_is_reported() {
        let data = b"  5";
        let mut cursor = &data[..];
        let mut r = AsciiReader::new(&mut cursor);
        assert!(matches!(
            r.seek_past_char(b'['),
            Err(Error::MalformedStream(_))
        ));
    }

    #[test]
    fn truncated_stream_is_reported() {
        let data = b"[";
        let mut cursor = &data[..];
        let mut r = AsciiReader::new(&mut cursor);
        r.seek_past_char(b'[').unwrap();
        assert!(matches!(r.token(), Err(Error::MalformedStream(_))));
    }
}
