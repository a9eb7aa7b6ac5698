/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;
use std::collections::HashSet;

use log::debug;

use crate::{StatsTagConfig, Tag, TagConfigError, TagExtractor, TagSpecifier, TagValueSource};

/// The frozen result of a stats tag config.
///
/// It is immutable after build, and can be shared by all sinks.
#[derive(Clone, Debug, Default)]
pub struct TagProducer {
    extractors: Vec<TagExtractor>,
    static_tags: Vec<Tag>,
}

impl TagProducer {
    /// Build with variables looked up in the process environment.
    pub fn build(config: &StatsTagConfig) -> Result<Self, TagConfigError> {
        TagProducer::build_with_env(config, |var| std::env::var(var).ok())
    }

    pub fn build_with_env<F>(config: &StatsTagConfig, env: F) -> Result<Self, TagConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        detect_tag_name_conflict(config)?;
        let extractors = create_tag_extractors(config)?;
        let static_tags = create_static_tags(config, env)?;
        debug!(
            "stats tag producer built with {} extractors and {} static tags",
            extractors.len(),
            static_tags.len()
        );
        Ok(TagProducer {
            extractors,
            static_tags,
        })
    }

    #[inline]
    pub fn extractors(&self) -> &[TagExtractor] {
        &self.extractors
    }

    #[inline]
    pub fn static_tags(&self) -> &[Tag] {
        &self.static_tags
    }

    /// Apply all extractors in order, each one on the name left by the
    /// previous one, then append the static tags.
    ///
    /// Returns the name with all tag spans removed.
    pub fn produce_tags<'a>(&self, stat_name: &'a str, tags: &mut Vec<Tag>) -> Cow<'a, str> {
        let mut name = Cow::Borrowed(stat_name);
        for extractor in &self.extractors {
            let (residual, tag) = extractor.extract_tag(&name);
            if let Some(tag) = tag {
                name = Cow::Owned(residual.into_owned());
                tags.push(tag);
            }
        }
        tags.extend_from_slice(&self.static_tags);
        name
    }
}

/// Fail if any tag name would be defined twice.
///
/// All default tag names are reserved when default tags are enabled, and the
/// specifiers are checked whatever their value source is. An empty tag name is
/// rejected here for every kind of specifier.
pub fn detect_tag_name_conflict(config: &StatsTagConfig) -> Result<(), TagConfigError> {
    let mut names: HashSet<&str> = HashSet::new();
    if config.use_default_tags() {
        for (name, _) in crate::names::default_tag_regex() {
            names.insert(name);
        }
    }

    for spec in config.tags() {
        if spec.tag_name().is_empty() {
            return Err(TagConfigError::EmptyTagName);
        }
        if !names.insert(spec.tag_name()) {
            return Err(TagConfigError::DuplicateTagName(spec.tag_name().to_string()));
        }
    }
    Ok(())
}

/// Create the ordered extractor list.
///
/// A specifier for a name that is already present replaces that extractor at
/// its position, so a user regex can override a default one.
pub fn create_tag_extractors(config: &StatsTagConfig) -> Result<Vec<TagExtractor>, TagConfigError> {
    let mut extractors = Vec::new();
    if config.use_default_tags() {
        for (name, regex) in crate::names::default_tag_regex() {
            extractors.push(TagExtractor::new(name, regex)?);
        }
    }

    for spec in config.tags() {
        if spec.is_static() {
            continue;
        }
        let extractor = new_extractor(spec)?;
        if let Some(exist) = extractors.iter_mut().find(|e| e.name() == spec.tag_name()) {
            *exist = extractor;
        } else {
            extractors.push(extractor);
        }
    }
    Ok(extractors)
}

fn new_extractor(spec: &TagSpecifier) -> Result<TagExtractor, TagConfigError> {
    let regex = match spec.explicit_regex() {
        Some(regex) => regex,
        None => crate::names::default_regex(spec.tag_name())
            .ok_or_else(|| TagConfigError::NoRegex(spec.tag_name().to_string()))?,
    };
    TagExtractor::new(spec.tag_name(), regex)
}

/// Create the tags with values that do not depend on the stats name.
pub fn create_static_tags<F>(config: &StatsTagConfig, env: F) -> Result<Vec<Tag>, TagConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut tags = Vec::new();
    for spec in config.tags() {
        match spec.value_source() {
            TagValueSource::FixedValue(value) => {
                tags.push(Tag::new(spec.tag_name(), value.as_str()));
            }
            TagValueSource::EnvironmentVariable(var) => {
                let Some(value) = env(var) else {
                    return Err(TagConfigError::EnvironmentVariableNotFound {
                        var: var.to_string(),
                        tag: spec.tag_name().to_string(),
                    });
                };
                tags.push(Tag::new(spec.tag_name(), value));
            }
            TagValueSource::Unset | TagValueSource::Regex(_) => {}
        }
    }
    Ok(tags)
}
