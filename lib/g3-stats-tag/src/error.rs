/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagConfigError {
    #[error("empty tag name")]
    EmptyTagName,
    #[error("tag name '{0}' specified twice")]
    DuplicateTagName(String),
    #[error("no regex specified for tag specifier and no default regex for name: '{0}'")]
    NoRegex(String),
    #[error("invalid regex for tag '{tag}': {source}")]
    InvalidRegex {
        tag: String,
        #[source]
        source: regex::Error,
    },
    #[error(
        "regex for tag '{tag}' should have 1 (value is also removed) or 2 (removed span, value) capture groups, but found {groups}"
    )]
    InvalidCaptureGroups { tag: String, groups: usize },
    #[error(
        "environment variable '{var}' is specified for the tag '{tag}' in tag specifier config, but the variable was not found"
    )]
    EnvironmentVariableNotFound { var: String, tag: String },
}
