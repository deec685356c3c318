/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod buf_reader;
mod buffered;
mod config;
mod error;
mod reader;
mod scan;
mod worker;

pub use buf_reader::{BufferedReader, DEFAULT_BUFFER_SIZE};
pub use buffered::BufferedRead;
pub use config::ReadTimeoutConfig;
pub use error::{ReadTimeoutError, ReadTimeoutResult};
pub use reader::TimeoutReader;
pub use scan::{DEFAULT_MAX_TOKEN_SIZE, LineScanner, Scan, TimeoutScanner};
