/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::{StatsTagConfig, TagSpecifier, TagValueSource};

impl TagSpecifier {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => {
                let mut tag_name: Option<String> = None;
                let mut value_source = TagValueSource::Unset;

                let mut set_source = |k: &str, source: TagValueSource| {
                    if value_source != TagValueSource::Unset {
                        return Err(anyhow!(
                            "key {k} conflicts with a previously set value source"
                        ));
                    }
                    value_source = source;
                    Ok(())
                };

                g3_yaml::foreach_kv(map, |k, v| match g3_yaml::key::normalize(k).as_str() {
                    "tag_name" | "name" => {
                        let name = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        tag_name = Some(name);
                        Ok(())
                    }
                    "regex" => {
                        let regex = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        set_source(k, TagValueSource::Regex(regex))
                    }
                    "fixed_value" => {
                        let value = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        set_source(k, TagValueSource::FixedValue(value))
                    }
                    "environment_variable" | "env" => {
                        let var = g3_yaml::value::as_string(v)
                            .context(format!("invalid string value for key {k}"))?;
                        set_source(k, TagValueSource::EnvironmentVariable(var))
                    }
                    _ => Err(anyhow!("invalid key {k}")),
                })?;

                match tag_name {
                    Some(name) if !name.is_empty() => Ok(TagSpecifier {
                        tag_name: name,
                        value_source,
                    }),
                    Some(_) => Err(anyhow!("empty tag name")),
                    None => Err(anyhow!("no tag name has been set")),
                }
            }
            Yaml::String(s) => {
                if s.is_empty() {
                    Err(anyhow!("empty tag name"))
                } else {
                    Ok(TagSpecifier::new(s))
                }
            }
            _ => Err(anyhow!(
                "yaml value type for 'tag specifier' should be 'map' or 'string'"
            )),
        }
    }
}

impl StatsTagConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        if let Yaml::Hash(map) = v {
            let mut config = StatsTagConfig::default();
            g3_yaml::foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
            Ok(config)
        } else {
            Err(anyhow!(
                "yaml value type for 'stats tag config' should be 'map'"
            ))
        }
    }

    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "use_all_default_tags" | "use_default_tags" => {
                let enable = g3_yaml::value::as_bool(v)
                    .context(format!("invalid bool value for key {k}"))?;
                self.use_all_default_tags = Some(enable);
            }
            "tags" | "stats_tags" => {
                self.tags = g3_yaml::value::as_list(v, TagSpecifier::parse_yaml)
                    .context(format!("invalid tag specifier list value for key {k}"))?;
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }
}
