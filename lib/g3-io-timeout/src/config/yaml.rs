/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::time::Duration;

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::ReadTimeoutConfig;

fn normalize_key(raw: &str) -> String {
    raw.to_lowercase().replace('-', "_")
}

/// Only the two shapes a read timeout is written in: a humanize string such
/// as "500ms" or a plain number of seconds.
fn as_duration(v: &Yaml) -> anyhow::Result<Duration> {
    match v {
        Yaml::String(value) => humanize_rs::duration::parse(value)
            .map_err(|e| anyhow!("invalid humanize duration string: {e}")),
        Yaml::Integer(value) => u64::try_from(*value)
            .map(Duration::from_secs)
            .map_err(|_| anyhow!("negative duration value")),
        _ => Err(anyhow!(
            "yaml value type for duration should be 'string' or 'integer'"
        )),
    }
}

impl ReadTimeoutConfig {
    pub fn parse_yaml(value: &Yaml) -> anyhow::Result<Self> {
        match value {
            Yaml::Hash(map) => {
                let mut config = ReadTimeoutConfig::default();
                for (k, v) in map.iter() {
                    let Yaml::String(k) = k else {
                        return Err(anyhow!("key in hash should be string"));
                    };
                    match normalize_key(k).as_str() {
                        "timeout" | "read_timeout" => {
                            let timeout = as_duration(v)
                                .context(format!("invalid humanize duration value for key {k}"))?;
                            config.set_timeout(timeout);
                        }
                        "thread_name" => {
                            let Yaml::String(name) = v else {
                                return Err(anyhow!("invalid string value for key {k}"));
                            };
                            config.set_thread_name(name);
                        }
                        _ => return Err(anyhow!("invalid key {k}")),
                    }
                }
                config.check()?;
                Ok(config)
            }
            // a bare value is taken as the timeout
            Yaml::String(_) | Yaml::Integer(_) => {
                let timeout = as_duration(value).context("invalid timeout value")?;
                Ok(ReadTimeoutConfig::with_timeout(timeout))
            }
            _ => Err(anyhow!("invalid yaml type")),
        }
    }
}
