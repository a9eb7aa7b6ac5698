/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2023-2025 ByteDance and/or its affiliates.
 */

use std::net::SocketAddr;
use std::str::FromStr;

use anyhow::anyhow;
use yaml_rust::Yaml;

pub fn as_sockaddr(v: &Yaml) -> anyhow::Result<SocketAddr> {
    if let Yaml::String(s) = v {
        SocketAddr::from_str(s).map_err(|e| anyhow!("invalid socket address {s}: {e}"))
    } else {
        Err(anyhow!(
            "yaml value type for 'SocketAddr' should be 'string'"
        ))
    }
}

/// Parse a socket address, or the value of the environment variable named
/// after a leading '$'.
pub fn as_env_sockaddr(v: &Yaml) -> anyhow::Result<SocketAddr> {
    if let Yaml::String(s) = v
        && let Some(var) = s.strip_prefix('$')
    {
        let value = std::env::var(var)
            .map_err(|e| anyhow!("failed to read environment variable {var}: {e}"))?;
        SocketAddr::from_str(&value)
            .map_err(|e| anyhow!("invalid socket address {value} in env {var}: {e}"))
    } else {
        as_sockaddr(v)
    }
}
