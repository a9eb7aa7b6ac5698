/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use std::borrow::Cow;

use regex::Regex;

use crate::{Tag, TagConfigError};

/// Extract one tag from a stats name with a regex.
///
/// The regex should have one or two capture groups:
///
///  - with two groups, the span of group 1 is removed from the name, and the
///    text of group 2 is used as the tag value. Group 1 normally includes the
///    delimiter, like `^cluster\.((.*?)\.)`.
///  - with only one group, its span is both removed and used as the value.
#[derive(Clone, Debug)]
pub struct TagExtractor {
    name: String,
    regex: Regex,
    value_group: usize,
}

impl TagExtractor {
    pub fn new(name: &str, regex: &str) -> Result<Self, TagConfigError> {
        if name.is_empty() {
            return Err(TagConfigError::EmptyTagName);
        }

        let regex = Regex::new(regex).map_err(|e| TagConfigError::InvalidRegex {
            tag: name.to_string(),
            source: e,
        })?;
        // captures_len() counts the implicit whole match group
        let value_group = match regex.captures_len() - 1 {
            1 => 1,
            2 => 2,
            n => {
                return Err(TagConfigError::InvalidCaptureGroups {
                    tag: name.to_string(),
                    groups: n,
                });
            }
        };

        Ok(TagExtractor {
            name: name.to_string(),
            regex,
            value_group,
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Returns the name with the matched span removed and the extracted tag.
    ///
    /// The input is returned unchanged, without any tag, if the regex does
    /// not match or if a capture group does not participate in the match.
    pub fn extract_tag<'a>(&self, stat_name: &'a str) -> (Cow<'a, str>, Option<Tag>) {
        let Some(caps) = self.regex.captures(stat_name) else {
            return (Cow::Borrowed(stat_name), None);
        };
        let (Some(remove), Some(value)) = (caps.get(1), caps.get(self.value_group)) else {
            return (Cow::Borrowed(stat_name), None);
        };

        let mut residual = String::with_capacity(stat_name.len() - remove.len());
        residual.push_str(&stat_name[..remove.start()]);
        residual.push_str(&stat_name[remove.end()..]);

        let tag = Tag::new(self.name.as_str(), value.as_str());
        (Cow::Owned(residual), Some(tag))
    }
}
