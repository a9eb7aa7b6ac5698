/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

use anyhow::{Context, anyhow};
use yaml_rust::Yaml;

use super::MetricsServiceConfig;

impl MetricsServiceConfig {
    pub fn parse_yaml(v: &Yaml) -> anyhow::Result<Self> {
        match v {
            Yaml::Hash(map) => {
                let mut config = MetricsServiceConfig::default();
                g3_yaml::foreach_kv(map, |k, v| config.set_by_yaml_kv(k, v))?;
                config.check()?;
                Ok(config)
            }
            _ => Err(anyhow!(
                "yaml value type for 'metrics service config' should be 'map'"
            )),
        }
    }

    fn set_by_yaml_kv(&mut self, k: &str, v: &Yaml) -> anyhow::Result<()> {
        match g3_yaml::key::normalize(k).as_str() {
            "collector" | "address" | "addr" => {
                self.collector = g3_yaml::value::as_env_sockaddr(v).context(format!(
                    "invalid collector socket address value for key {k}"
                ))?;
            }
            "connect_timeout" => {
                self.connect_timeout = g3_yaml::humanize::as_duration(v)
                    .context(format!("invalid humanize duration value for key {k}"))?;
            }
            "queue_size" => {
                self.queue_size = g3_yaml::value::as_nonzero_usize(v)
                    .context(format!("invalid nonzero usize value for key {k}"))?;
            }
            "service_cluster" | "cluster" => {
                self.service_cluster = g3_yaml::value::as_string(v)
                    .context(format!("invalid string value for key {k}"))?;
            }
            "service_node" | "node" => {
                self.service_node = g3_yaml::value::as_string(v)
                    .context(format!("invalid string value for key {k}"))?;
            }
            "zone" | "service_zone" => {
                self.zone = g3_yaml::value::as_string(v)
                    .context(format!("invalid string value for key {k}"))?;
            }
            _ => return Err(anyhow!("invalid key {k}")),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use g3_yaml::yaml_doc;
    use std::net::SocketAddr;
    use std::str::FromStr;
    use std::time::Duration;
    use yaml_rust::YamlLoader;

    #[test]
    fn parse_yaml_ok() {
        let yaml = yaml_doc!(
            r#"
                collector: "127.0.0.1:9901"
                connect_timeout: 3s
                queue_size: 128
                service_cluster: proxy
                service_node: proxy-1
                zone: az-1
            "#
        );
        let config = MetricsServiceConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(
            config.collector(),
            SocketAddr::from_str("127.0.0.1:9901").unwrap()
        );
        assert_eq!(config.connect_timeout, Duration::from_secs(3));
        assert_eq!(config.queue_size.get(), 128);
        assert_eq!(config.service_cluster, "proxy");
        assert_eq!(config.service_node, "proxy-1");
        assert_eq!(config.zone, "az-1");

        let yaml = yaml_doc!(
            r#"
                addr: "[::1]:9902"
                cluster: proxy
                node: proxy-2
            "#
        );
        let config = MetricsServiceConfig::parse_yaml(&yaml).unwrap();
        assert_eq!(config.collector().port(), 9902);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.queue_size.get(), 64);
        assert!(config.zone.is_empty());
    }

    #[test]
    fn parse_yaml_err() {
        let yaml = yaml_doc!(
            r#"
                collector: "127.0.0.1:9901"
            "#
        );
        let e = MetricsServiceConfig::parse_yaml(&yaml).unwrap_err();
        assert_eq!(
            e.to_string(),
            "metrics service: setting service cluster and service node is required"
        );

        let yaml = yaml_doc!(
            r#"
                collector: "localhost"
                service_cluster: proxy
                service_node: proxy-1
            "#
        );
        assert!(MetricsServiceConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!(
            r#"
                queue_size: 0
                service_cluster: proxy
                service_node: proxy-1
            "#
        );
        assert!(MetricsServiceConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!(
            r#"
                connect_timeout: "1xs"
            "#
        );
        assert!(MetricsServiceConfig::parse_yaml(&yaml).is_err());

        let yaml = yaml_doc!(
            r#"
                invalid_key: 1
            "#
        );
        assert!(MetricsServiceConfig::parse_yaml(&yaml).is_err());

        assert!(MetricsServiceConfig::parse_yaml(&Yaml::Integer(1)).is_err());
        assert!(MetricsServiceConfig::parse_yaml(&Yaml::Null).is_err());
    }
}
