/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::char::REPLACEMENT_CHARACTER;
use std::io::{self, BufRead, Cursor};

const UNBOUNDED: usize = usize::MAX;
const UTF8_MAX: usize = 4;

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => 0,
    }
}

enum Rune {
    Valid(char, usize),
    Invalid,
    Partial,
}

fn decode_rune(b: &[u8]) -> Rune {
    let width = match utf8_width(b[0]) {
        0 => return Rune::Invalid,
        1 => return Rune::Valid(char::from(b[0]), 1),
        w => w,
    };
    let n = b.len().min(width);
    match std::str::from_utf8(&b[..n]) {
        Ok(s) => match s.chars().next() {
            Some(c) => Rune::Valid(c, n),
            None => Rune::Invalid,
        },
        // a valid prefix cut short by the end of the input
        Err(e) if e.error_len().is_none() => Rune::Partial,
        Err(_) => Rune::Invalid,
    }
}

enum SliceEnd {
    Delim,
    Full,
    Eof,
}

/// Copy out the bytes up to and including `delim`, without consuming them.
fn scan_slice<R>(r: &mut R, delim: u8) -> io::Result<(Vec<u8>, SliceEnd)>
where
    R: BufferedRead + ?Sized,
{
    let cap = r.buffer_capacity();
    let mut searched = 0;
    loop {
        let buf = r.fill_to(searched + 1)?;
        if let Some(i) = memchr::memchr(delim, &buf[searched..]) {
            return Ok((buf[..searched + i + 1].to_vec(), SliceEnd::Delim));
        }
        if buf.len() >= cap {
            return Ok((buf[..cap].to_vec(), SliceEnd::Full));
        }
        if buf.len() == searched {
            return Ok((buf.to_vec(), SliceEnd::Eof));
        }
        searched = buf.len();
    }
}

/// Blocking read operations of a buffered reader.
///
/// End of stream is reported the std way: an empty result for the delimiter
/// based reads, `UnexpectedEof` for the single value reads.
pub trait BufferedRead: BufRead {
    /// Size of the internal buffer. `peek` and `read_slice` are bounded by it.
    fn buffer_capacity(&self) -> usize;

    /// Number of bytes that can be read without touching the inner reader.
    fn buffered_len(&self) -> usize;

    /// Read until at least `n` bytes are buffered, the buffer is full or the
    /// stream ends, then return the buffered bytes.
    fn fill_to(&mut self, n: usize) -> io::Result<&[u8]>;

    /// Return the next `n` bytes without consuming them.
    ///
    /// Blocks until `n` bytes are buffered. Fails with `InvalidInput` if `n`
    /// is larger than the buffer, and with `UnexpectedEof` if the stream ends
    /// first.
    fn peek(&mut self, n: usize) -> io::Result<Vec<u8>> {
        if n > self.buffer_capacity() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "peek size exceeds buffer capacity",
            ));
        }
        let buf = self.fill_to(n)?;
        if buf.len() < n {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        Ok(buf[..n].to_vec())
    }

    /// Skip `n` bytes, returning the number actually skipped.
    fn discard(&mut self, n: usize) -> io::Result<usize> {
        let mut left = n;
        while left > 0 {
            let available = self.fill_to(1)?.len();
            if available == 0 {
                break;
            }
            let amt = available.min(left);
            self.consume(amt);
            left -= amt;
        }
        Ok(n - left)
    }

    fn read_byte(&mut self) -> io::Result<u8> {
        let b = match self.fill_to(1)?.first() {
            Some(&b) => b,
            None => return Err(io::Error::from(io::ErrorKind::UnexpectedEof)),
        };
        self.consume(1);
        Ok(b)
    }

    /// Read one UTF-8 encoded char and return it with the number of bytes
    /// consumed.
    ///
    /// An invalid or truncated encoding yields `(U+FFFD, 1)` and only its
    /// first byte is consumed.
    fn read_rune(&mut self) -> io::Result<(char, usize)> {
        let mut want = 1;
        let rune = loop {
            let buf = self.fill_to(want)?;
            if buf.is_empty() {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
            }
            let avail = buf.len().min(UTF8_MAX);
            match decode_rune(&buf[..avail]) {
                Rune::Partial if buf.len() >= want && avail < UTF8_MAX => want = avail + 1,
                Rune::Partial => break Rune::Invalid,
                r => break r,
            }
        };
        match rune {
            Rune::Valid(c, len) => {
                self.consume(len);
                Ok((c, len))
            }
            _ => {
                self.consume(1);
                Ok((REPLACEMENT_CHARACTER, 1))
            }
        }
    }

    /// Read up to and including `delim`.
    ///
    /// The flag is set if the buffer filled up before `delim` showed up. The
    /// returned bytes are then exactly one buffer long and the rest of the
    /// line follows on the next call. At end of stream the remaining bytes
    /// are returned without `delim`, and an empty result means nothing was left.
    fn read_slice(&mut self, delim: u8) -> io::Result<(Vec<u8>, bool)> {
        let (line, end) = scan_slice(self, delim)?;
        self.consume(line.len());
        Ok((line, matches!(end, SliceEnd::Full)))
    }

    /// Read a line without its `\n` or `\r\n` ending. The flag is set if the
    /// line was too long for the buffer and continues on the next call.
    fn read_line_prefix(&mut self) -> io::Result<(Vec<u8>, bool)> {
        let (mut line, end) = scan_slice(self, b'\n')?;
        match end {
            SliceEnd::Delim => {
                self.consume(line.len());
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                Ok((line, false))
            }
            SliceEnd::Full => {
                // a "\r\n" split by the buffer end is dropped on the next call
                if line.len() > 1 && line.last() == Some(&b'\r') {
                    line.pop();
                }
                self.consume(line.len());
                Ok((line, true))
            }
            SliceEnd::Eof => {
                if line.is_empty() {
                    return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
                }
                self.consume(line.len());
                Ok((line, false))
            }
        }
    }

    /// Read up to and including `delim` with no size limit.
    fn read_bytes(&mut self, delim: u8) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_until(delim, &mut buf)?;
        Ok(buf)
    }

    fn read_string(&mut self, delim: u8) -> io::Result<String> {
        let buf = self.read_bytes(delim)?;
        String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

// In memory readers hold the whole rest of the stream in their buffer.

impl<T: AsRef<[u8]>> BufferedRead for Cursor<T> {
    fn buffer_capacity(&self) -> usize {
        UNBOUNDED
    }

    fn buffered_len(&self) -> usize {
        let len = self.get_ref().as_ref().len() as u64;
        len.saturating_sub(self.position()) as usize
    }

    fn fill_to(&mut self, _n: usize) -> io::Result<&[u8]> {
        let data = self.get_ref().as_ref();
        let pos = usize::try_from(self.position())
            .unwrap_or(usize::MAX)
            .min(data.len());
        Ok(&data[pos..])
    }
}

impl BufferedRead for &[u8] {
    fn buffer_capacity(&self) -> usize {
        UNBOUNDED
    }

    fn buffered_len(&self) -> usize {
        self.len()
    }

    fn fill_to(&mut self, _n: usize) -> io::Result<&[u8]> {
        Ok(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BufferedReader;

    fn small_reader(data: &'static [u8], cap: usize) -> BufferedReader<&'static [u8]> {
        BufferedReader::with_capacity(cap, data)
    }

    #[test]
    fn peek_and_discard() {
        let mut r = small_reader(b"hello world", 4);
        assert_eq!(r.peek(2).unwrap(), b"he");
        assert_eq!(r.peek(4).unwrap(), b"hell");
        assert!(r.peek(0).unwrap().is_empty());
        let e = r.peek(5).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidInput);

        assert_eq!(r.discard(6).unwrap(), 6);
        assert_eq!(r.read_byte().unwrap(), b'w');
        // refills across the buffer end
        assert_eq!(r.peek(4).unwrap(), b"orld");
        assert_eq!(r.discard(10).unwrap(), 4);

        let e = r.peek(1).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
        let e = r.read_byte().unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn peek_short_stream() {
        let mut r = small_reader(b"abc", 8);
        let e = r.peek(4).unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::UnexpectedEof);
        // nothing consumed
        assert_eq!(r.peek(3).unwrap(), b"abc");

        let mut r: &[u8] = b"abc";
        assert_eq!(r.peek(3).unwrap(), b"abc");
        assert_eq!(r.peek(4).unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn read_rune() {
        let mut r = small_reader("a\u{e9}\u{4e2d}\u{1f600}".as_bytes(), 4);
        assert_eq!(r.read_rune().unwrap(), ('a', 1));
        assert_eq!(r.read_rune().unwrap(), ('\u{e9}', 2));
        assert_eq!(r.read_rune().unwrap(), ('\u{4e2d}', 3));
        assert_eq!(r.read_rune().unwrap(), ('\u{1f600}', 4));
        assert_eq!(
            r.read_rune().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn read_rune_invalid() {
        let mut r: &[u8] = &[0xFF, 0xE4, b'x', 0xC3];
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), ('x', 1));
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
    }

    #[test]
    fn read_rune_overlong() {
        let mut r = small_reader(&[0xE0, 0x80, 0x80, b'a'], 4);
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), ('a', 1));
    }

    #[test]
    fn read_rune_surrogate() {
        let mut r: &[u8] = &[0xED, 0xA0, 0x80, b'b'];
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r, &[0xA0, 0x80, b'b']);
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), ('b', 1));
    }

    #[test]
    fn read_rune_truncated() {
        // first two bytes of U+4E2D, then end of stream
        let mut r = small_reader(&[b'z', 0xE4, 0xB8], 2);
        assert_eq!(r.read_rune().unwrap(), ('z', 1));
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(r.read_rune().unwrap(), (REPLACEMENT_CHARACTER, 1));
        assert_eq!(
            r.read_rune().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn read_slice() {
        let mut r = small_reader(b"ab\ncdefgh\nij", 4);
        assert_eq!(r.read_slice(b'\n').unwrap(), (b"ab\n".to_vec(), false));
        assert_eq!(r.read_slice(b'\n').unwrap(), (b"cdef".to_vec(), true));
        assert_eq!(r.read_slice(b'\n').unwrap(), (b"gh\n".to_vec(), false));
        assert_eq!(r.read_slice(b'\n').unwrap(), (b"ij".to_vec(), false));
        assert_eq!(r.read_slice(b'\n').unwrap(), (Vec::new(), false));
    }

    #[test]
    fn read_slice_unbounded() {
        let mut r = Cursor::new(b"abcdefgh".to_vec());
        assert_eq!(r.read_slice(b'\n').unwrap(), (b"abcdefgh".to_vec(), false));
        assert_eq!(r.buffered_len(), 0);
    }

    #[test]
    fn read_line_prefix() {
        let mut r = small_reader(b"ab\r\ncdefgh\nij", 4);
        assert_eq!(r.read_line_prefix().unwrap(), (b"ab".to_vec(), false));
        assert_eq!(r.read_line_prefix().unwrap(), (b"cdef".to_vec(), true));
        assert_eq!(r.read_line_prefix().unwrap(), (b"gh".to_vec(), false));
        assert_eq!(r.read_line_prefix().unwrap(), (b"ij".to_vec(), false));
        assert_eq!(
            r.read_line_prefix().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn read_line_prefix_split_crlf() {
        let mut r = small_reader(b"abc\r\nxy\n", 4);
        assert_eq!(r.read_line_prefix().unwrap(), (b"abc".to_vec(), true));
        assert_eq!(r.read_line_prefix().unwrap(), (Vec::new(), false));
        assert_eq!(r.read_line_prefix().unwrap(), (b"xy".to_vec(), false));
        assert_eq!(
            r.read_line_prefix().unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof
        );
    }

    #[test]
    fn read_bytes_and_string() {
        let mut r = Cursor::new(b"line one\nline two".to_vec());
        assert_eq!(r.read_bytes(b'\n').unwrap(), b"line one\n");
        assert_eq!(r.read_string(b'\n').unwrap(), "line two");
        assert_eq!(r.read_string(b'\n').unwrap(), "");

        let mut r: &[u8] = &[0xFF, b'\n'];
        let e = r.read_string(b'\n').unwrap_err();
        assert_eq!(e.kind(), io::ErrorKind::InvalidData);
    }
}
