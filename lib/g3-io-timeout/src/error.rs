/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

use thiserror::Error;

pub type ReadTimeoutResult<T> = Result<T, ReadTimeoutError>;

#[derive(Debug, Error)]
pub enum ReadTimeoutError {
    /// The deadline elapsed before the underlying operation completed.
    #[error("timeout on reading")]
    Timeout,
    /// Error returned by the underlying reader, kept as is.
    #[error("io error: {0:?}")]
    Io(#[from] io::Error),
    #[error("read worker panicked: {0}")]
    WorkerPanicked(String),
    #[error("unable to spawn read worker: {0:?}")]
    SpawnFailed(io::Error),
}

impl ReadTimeoutError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ReadTimeoutError::Timeout)
    }

    pub fn as_io(&self) -> Option<&io::Error> {
        match self {
            ReadTimeoutError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReadTimeoutError> for io::Error {
    fn from(e: ReadTimeoutError) -> Self {
        match e {
            ReadTimeoutError::Io(e) => e,
            ReadTimeoutError::Timeout => {
                io::Error::new(io::ErrorKind::TimedOut, ReadTimeoutError::Timeout)
            }
            e => io::Error::other(e),
        }
    }
}
