/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::anyhow;

#[cfg(feature = "yaml")]
mod yaml;

const DEFAULT_THREAD_NAME: &str = "io-timeout";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadTimeoutConfig {
    timeout: Duration,
    thread_name: String,
}

impl Default for ReadTimeoutConfig {
    fn default() -> Self {
        ReadTimeoutConfig::with_timeout(Duration::ZERO)
    }
}

impl ReadTimeoutConfig {
    /// A zero timeout disables the deadline, every call blocks until the
    /// underlying operation returns.
    pub fn with_timeout(timeout: Duration) -> Self {
        ReadTimeoutConfig {
            timeout,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_thread_name(&mut self, name: &str) {
        self.thread_name = name.to_string();
    }

    #[inline]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    #[inline]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn check(&self) -> anyhow::Result<()> {
        if self.thread_name.is_empty() {
            return Err(anyhow!("empty worker thread name"));
        }
        if self.thread_name.contains('\0') {
            return Err(anyhow!("worker thread name should not contain nul byte"));
        }
        Ok(())
    }
}
