/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

#[cfg(feature = "yaml")]
mod yaml;

/// Where the value of a configured tag comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum TagValueSource {
    /// Use the built-in regex for the tag name.
    #[default]
    Unset,
    Regex(String),
    FixedValue(String),
    EnvironmentVariable(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagSpecifier {
    pub(crate) tag_name: String,
    pub(crate) value_source: TagValueSource,
}

impl TagSpecifier {
    pub fn new(tag_name: &str) -> Self {
        TagSpecifier {
            tag_name: tag_name.to_string(),
            value_source: TagValueSource::Unset,
        }
    }

    pub fn with_regex(tag_name: &str, regex: &str) -> Self {
        let mut spec = TagSpecifier::new(tag_name);
        spec.set_regex(regex);
        spec
    }

    pub fn with_fixed_value(tag_name: &str, value: &str) -> Self {
        let mut spec = TagSpecifier::new(tag_name);
        spec.set_fixed_value(value);
        spec
    }

    pub fn with_environment_variable(tag_name: &str, var: &str) -> Self {
        let mut spec = TagSpecifier::new(tag_name);
        spec.set_environment_variable(var);
        spec
    }

    #[inline]
    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    #[inline]
    pub fn value_source(&self) -> &TagValueSource {
        &self.value_source
    }

    pub fn set_regex(&mut self, regex: &str) {
        self.value_source = TagValueSource::Regex(regex.to_string());
    }

    pub fn set_fixed_value(&mut self, value: &str) {
        self.value_source = TagValueSource::FixedValue(value.to_string());
    }

    pub fn set_environment_variable(&mut self, var: &str) {
        self.value_source = TagValueSource::EnvironmentVariable(var.to_string());
    }

    /// The explicit regex, if this specifier produces a regex based extractor.
    ///
    /// An empty regex is treated the same as no regex.
    pub(crate) fn explicit_regex(&self) -> Option<&str> {
        match &self.value_source {
            TagValueSource::Regex(r) if !r.is_empty() => Some(r.as_str()),
            _ => None,
        }
    }

    pub(crate) fn is_static(&self) -> bool {
        matches!(
            self.value_source,
            TagValueSource::FixedValue(_) | TagValueSource::EnvironmentVariable(_)
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatsTagConfig {
    pub(crate) use_all_default_tags: Option<bool>,
    pub(crate) tags: Vec<TagSpecifier>,
}

impl StatsTagConfig {
    pub fn set_use_all_default_tags(&mut self, enable: bool) {
        self.use_all_default_tags = Some(enable);
    }

    pub fn push_tag(&mut self, tag: TagSpecifier) {
        self.tags.push(tag);
    }

    /// Defaults are enabled unless explicitly turned off.
    #[inline]
    pub fn use_default_tags(&self) -> bool {
        self.use_all_default_tags.unwrap_or(true)
    }

    #[inline]
    pub fn tags(&self) -> &[TagSpecifier] {
        &self.tags
    }
}
