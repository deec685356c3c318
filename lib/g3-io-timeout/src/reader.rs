/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io::{self, Read};
use std::time::Duration;

use crate::worker::TimeoutWorker;
use crate::{BufferedRead, ReadTimeoutConfig, ReadTimeoutResult};

/// Adds a deadline to every blocking read of a buffered reader.
///
/// Each call with a non zero timeout runs the read on a worker thread and
/// waits for it at most `timeout`. If the deadline elapses the call returns
/// [`ReadTimeoutError::Timeout`](crate::ReadTimeoutError::Timeout) and the
/// worker is left running. Whatever that worker consumes from the reader is
/// lost to later calls, and later calls wait for it to release the reader.
///
/// A zero timeout runs every read directly on the caller thread.
pub struct TimeoutReader<R> {
    worker: TimeoutWorker<R>,
}

impl<R> TimeoutReader<R>
where
    R: BufferedRead + Send + 'static,
{
    pub fn new(reader: R, timeout: Duration) -> Self {
        TimeoutReader::with_config(reader, &ReadTimeoutConfig::with_timeout(timeout))
    }

    pub fn with_config(reader: R, config: &ReadTimeoutConfig) -> Self {
        TimeoutReader {
            worker: TimeoutWorker::new(reader, config),
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.worker.timeout()
    }

    /// Number of worker threads still running, including abandoned ones.
    pub fn pending_workers(&self) -> usize {
        self.worker.pending_workers()
    }

    /// Get back the inner reader, fails if an abandoned read still holds it.
    pub fn try_into_inner(self) -> Result<R, Self> {
        self.worker
            .into_inner()
            .map_err(|worker| TimeoutReader { worker })
    }

    /// Number of bytes the reader has buffered.
    pub fn buffered(&self) -> ReadTimeoutResult<usize> {
        self.worker.run(|r| r.buffered_len())
    }

    pub fn capacity(&self) -> ReadTimeoutResult<usize> {
        self.worker.run(|r| r.buffer_capacity())
    }

    /// Run `f` on the inner reader under the same deadline as the reads.
    ///
    /// While an abandoned read still holds the reader this waits for it and
    /// may return a timeout as well.
    pub fn with_inner<T, F>(&self, f: F) -> ReadTimeoutResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut R) -> T + Send + 'static,
    {
        self.worker.run(f)
    }

    pub fn peek(&self, n: usize) -> ReadTimeoutResult<Vec<u8>> {
        Ok(self.worker.run(move |r| r.peek(n))??)
    }

    pub fn discard(&self, n: usize) -> ReadTimeoutResult<usize> {
        Ok(self.worker.run(move |r| r.discard(n))??)
    }

    /// The buffer is left untouched if the deadline elapses.
    pub fn read(&self, buf: &mut [u8]) -> ReadTimeoutResult<usize> {
        let len = buf.len();
        let data = self.worker.run(move |r| {
            let mut data = vec![0u8; len];
            let nr = r.read(&mut data)?;
            data.truncate(nr);
            Ok::<_, io::Error>(data)
        })??;
        buf[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }

    pub fn read_byte(&self) -> ReadTimeoutResult<u8> {
        Ok(self.worker.run(|r| r.read_byte())??)
    }

    pub fn read_rune(&self) -> ReadTimeoutResult<(char, usize)> {
        Ok(self.worker.run(|r| r.read_rune())??)
    }

    /// The flag is set if the line was cut at the buffer capacity.
    pub fn read_slice(&self, delim: u8) -> ReadTimeoutResult<(Vec<u8>, bool)> {
        Ok(self.worker.run(move |r| r.read_slice(delim))??)
    }

    pub fn read_line(&self) -> ReadTimeoutResult<(Vec<u8>, bool)> {
        Ok(self.worker.run(|r| r.read_line_prefix())??)
    }

    pub fn read_bytes(&self, delim: u8) -> ReadTimeoutResult<Vec<u8>> {
        Ok(self.worker.run(move |r| r.read_bytes(delim))??)
    }

    pub fn read_string(&self, delim: u8) -> ReadTimeoutResult<String> {
        Ok(self.worker.run(move |r| r.read_string(delim))??)
    }
}

impl<R> Read for TimeoutReader<R>
where
    R: BufferedRead + Send + 'static,
{
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        TimeoutReader::read(self, buf).map_err(io::Error::from)
    }
}
