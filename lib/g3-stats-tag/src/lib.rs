/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

mod error;
pub use error::TagConfigError;

mod tag;
pub use tag::Tag;

mod extractor;
pub use extractor::TagExtractor;

pub mod names;

mod config;
pub use config::{StatsTagConfig, TagSpecifier, TagValueSource};

mod producer;
pub use producer::{
    TagProducer, create_static_tags, create_tag_extractors, detect_tag_name_conflict,
};
