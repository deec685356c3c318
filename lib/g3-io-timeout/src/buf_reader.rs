/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, BufRead, Read};

use crate::BufferedRead;

pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// A fixed size read buffer over any [`Read`].
///
/// Unlike `std::io::BufReader` the unread part of the buffer is moved to the
/// front when more room is needed, so a partially filled buffer can be
/// topped up. This is what lets `peek(n)` wait for exactly `n` bytes.
pub struct BufferedReader<R> {
    inner: R,
    buf: Box<[u8]>,
    pos: usize,
    end: usize,
}

impl<R: Read> BufferedReader<R> {
    pub fn new(inner: R) -> Self {
        BufferedReader::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    pub fn with_capacity(capacity: usize, inner: R) -> Self {
        BufferedReader {
            inner,
            buf: vec![0u8; capacity.max(1)].into_boxed_slice(),
            pos: 0,
            end: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// The buffered but not yet consumed bytes.
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        &self.buf[self.pos..self.end]
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Switch to a new inner reader. Buffered data is discarded.
    pub fn reset(&mut self, inner: R) -> R {
        self.pos = 0;
        self.end = 0;
        std::mem::replace(&mut self.inner, inner)
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn compact(&mut self) {
        if self.pos > 0 {
            self.buf.copy_within(self.pos..self.end, 0);
            self.end -= self.pos;
            self.pos = 0;
        }
    }

    /// One read into the free tail of the buffer. Zero means end of stream.
    fn read_more(&mut self) -> io::Result<usize> {
        loop {
            match self.inner.read(&mut self.buf[self.end..]) {
                Ok(nr) => {
                    self.end += nr;
                    return Ok(nr);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

impl<R: Read> Read for BufferedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos == self.end && buf.len() >= self.buf.len() {
            return self.inner.read(buf);
        }
        let nr = {
            let mut rem = self.fill_buf()?;
            rem.read(buf)?
        };
        self.consume(nr);
        Ok(nr)
    }
}

impl<R: Read> BufRead for BufferedReader<R> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        if self.pos == self.end {
            self.pos = 0;
            self.end = 0;
            self.read_more()?;
        }
        Ok(&self.buf[self.pos..self.end])
    }

    fn consume(&mut self, amt: usize) {
        self.pos = (self.pos + amt).min(self.end);
        if self.pos == self.end {
            self.pos = 0;
            self.end = 0;
        }
    }
}

impl<R: Read> BufferedRead for BufferedReader<R> {
    fn buffer_capacity(&self) -> usize {
        self.buf.len()
    }

    fn buffered_len(&self) -> usize {
        self.end - self.pos
    }

    fn fill_to(&mut self, n: usize) -> io::Result<&[u8]> {
        let want = n.min(self.buf.len());
        if self.pos + want > self.buf.len() {
            self.compact();
        }
        while self.end - self.pos < want {
            if self.read_more()? == 0 {
                break;
            }
        }
        Ok(&self.buf[self.pos..self.end])
    }
}
