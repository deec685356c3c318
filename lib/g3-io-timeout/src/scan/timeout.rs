/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::time::Duration;

use super::Scan;
use crate::worker::TimeoutWorker;
use crate::{ReadTimeoutConfig, ReadTimeoutError, ReadTimeoutResult};

/// Adds a deadline to each [`Scan::scan`] call.
///
/// A timed out scan returns false and the timeout is kept as the scanner
/// error for the rest of its life, so the usual loop
///
/// ```ignore
/// while scanner.scan() { /* use scanner.text() */ }
/// if let Some(e) = scanner.err() { /* e.is_timeout() */ }
/// ```
///
/// tells a timeout apart from the end of input, which leaves no error.
pub struct TimeoutScanner<S> {
    worker: TimeoutWorker<S>,
    token: Vec<u8>,
    sticky: Option<ReadTimeoutError>,
    native: Option<ReadTimeoutError>,
}

impl<S> TimeoutScanner<S>
where
    S: Scan + Send + 'static,
{
    pub fn new(scanner: S, timeout: Duration) -> Self {
        TimeoutScanner::with_config(scanner, &ReadTimeoutConfig::with_timeout(timeout))
    }

    pub fn with_config(scanner: S, config: &ReadTimeoutConfig) -> Self {
        TimeoutScanner {
            worker: TimeoutWorker::new(scanner, config),
            token: Vec::new(),
            sticky: None,
            native: None,
        }
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.worker.timeout()
    }

    pub fn pending_workers(&self) -> usize {
        self.worker.pending_workers()
    }

    /// Run `f` on the inner scanner, bounded by the scan timeout.
    ///
    /// A timeout here is returned to the caller and not recorded as the
    /// scanner error.
    pub fn with_inner<T, F>(&self, f: F) -> ReadTimeoutResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        self.worker.run(f)
    }

    pub fn scan(&mut self) -> bool {
        let r = self.worker.run(|s| {
            let more = s.scan();
            let token = if more { s.bytes().to_vec() } else { Vec::new() };
            (more, token, s.take_err())
        });
        match r {
            Ok((more, token, err)) => {
                if let Some(e) = err {
                    self.native = Some(ReadTimeoutError::Io(e));
                }
                if more {
                    self.token = token;
                }
                more
            }
            Err(e) => {
                // the first recorded failure stays
                if self.sticky.is_none() {
                    self.sticky = Some(e);
                }
                false
            }
        }
    }

    /// The timeout or worker failure if one was recorded, otherwise the
    /// error reported by the inner scanner.
    pub fn err(&self) -> Option<&ReadTimeoutError> {
        self.sticky.as_ref().or(self.native.as_ref())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.token
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.token)
    }
}
