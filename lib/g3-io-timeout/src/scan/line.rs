/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, BufRead};

use super::Scan;

pub const DEFAULT_MAX_TOKEN_SIZE: usize = 64 * 1024;

enum Step {
    Line,
    More,
    End,
}

/// Splits a buffered reader into newline terminated tokens.
///
/// The `\n` and one trailing `\r` are stripped. A last line without newline
/// is still returned as a token.
pub struct LineScanner<R> {
    reader: R,
    max_token_size: usize,
    token: Vec<u8>,
    err: Option<io::Error>,
    done: bool,
}

impl<R: BufRead> LineScanner<R> {
    pub fn new(reader: R) -> Self {
        LineScanner::with_max_token_size(reader, DEFAULT_MAX_TOKEN_SIZE)
    }

    pub fn with_max_token_size(reader: R, max_token_size: usize) -> Self {
        LineScanner {
            reader,
            max_token_size,
            token: Vec::new(),
            err: None,
            done: false,
        }
    }

    #[inline]
    pub fn max_token_size(&self) -> usize {
        self.max_token_size
    }

    /// Takes effect from the next token on.
    pub fn set_max_token_size(&mut self, size: usize) {
        self.max_token_size = size;
    }

    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn err(&self) -> Option<&io::Error> {
        self.err.as_ref()
    }

    fn fail(&mut self, e: io::Error) -> bool {
        self.token.clear();
        self.err = Some(e);
        self.done = true;
        false
    }

    fn end_token(&mut self) {
        if self.token.last() == Some(&b'\r') {
            self.token.pop();
        }
    }
}

impl<R: BufRead> Scan for LineScanner<R> {
    fn scan(&mut self) -> bool {
        if self.done {
            return false;
        }
        self.token.clear();

        loop {
            let r = match self.reader.fill_buf() {
                Ok([]) => Ok((Step::End, 0)),
                Ok(available) => match memchr::memchr(b'\n', available) {
                    Some(i) => {
                        self.token.extend_from_slice(&available[..i]);
                        Ok((Step::Line, i + 1))
                    }
                    None => {
                        self.token.extend_from_slice(available);
                        Ok((Step::More, available.len()))
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => Err(e),
            };
            let (step, used) = match r {
                Ok(v) => v,
                Err(e) => return self.fail(e),
            };
            self.reader.consume(used);

            if self.token.len() > self.max_token_size {
                return self.fail(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "token too long",
                ));
            }
            match step {
                Step::Line => {
                    self.end_token();
                    return true;
                }
                Step::More => {}
                Step::End => {
                    self.done = true;
                    if self.token.is_empty() {
                        return false;
                    }
                    self.end_token();
                    return true;
                }
            }
        }
    }

    fn bytes(&self) -> &[u8] {
        &self.token
    }

    fn take_err(&mut self) -> Option<io::Error> {
        self.err.take()
    }
}
