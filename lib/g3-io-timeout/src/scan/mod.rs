/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::io;

mod line;
pub use line::{DEFAULT_MAX_TOKEN_SIZE, LineScanner};

mod timeout;
pub use timeout::TimeoutScanner;

/// A blocking token scanner.
pub trait Scan {
    /// Advance to the next token, return false at the end of input or on error.
    fn scan(&mut self) -> bool;

    /// The token found by the last successful `scan`.
    fn bytes(&self) -> &[u8];

    /// Move out the error that stopped the scanner, if any.
    fn take_err(&mut self) -> Option<io::Error>;
}
