/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Well known tag names and the built-in regex for each of them.
//!
//! The table is ordered. Extractors are applied one after another, each one
//! to the name left by the previous one, so the more specific patterns must
//! come before the generic prefix ones.

pub const CLUSTER_NAME: &str = "cluster_name";
pub const LISTENER_ADDRESS: &str = "listener_address";
pub const HTTP_CONN_MANAGER_PREFIX: &str = "http_conn_manager_prefix";
pub const HTTP_USER_AGENT: &str = "http_user_agent";
pub const SSL_CIPHER: &str = "ssl_cipher";
pub const SSL_CIPHER_SUITE: &str = "cipher_suite";
pub const CLIENTSSL_PREFIX: &str = "clientssl_prefix";
pub const MONGO_PREFIX: &str = "mongo_prefix";
pub const MONGO_CMD: &str = "mongo_cmd";
pub const MONGO_COLLECTION: &str = "mongo_collection";
pub const MONGO_CALLSITE: &str = "mongo_callsite";
pub const RATELIMIT_PREFIX: &str = "ratelimit_prefix";
pub const TCP_PREFIX: &str = "tcp_prefix";
pub const FAULT_DOWNSTREAM_CLUSTER: &str = "fault_downstream_cluster";
pub const DYNAMO_OPERATION: &str = "dynamo_operation";
pub const DYNAMO_TABLE: &str = "dynamo_table";
pub const DYNAMO_PARTITION_ID: &str = "dynamo_partition_id";
pub const GRPC_BRIDGE_SERVICE: &str = "grpc_bridge_service";
pub const GRPC_BRIDGE_METHOD: &str = "grpc_bridge_method";
pub const VIRTUAL_HOST: &str = "virtual_host";
pub const VIRTUAL_CLUSTER: &str = "virtual_cluster";
pub const RESPONSE_CODE: &str = "response_code";
pub const RESPONSE_CODE_CLASS: &str = "response_code_class";

// `(?:\..*?)?` stands for "nothing, or a '.' followed by anything", as the
// regex engine has no look-around support.
static DEFAULT_TAG_REGEX: &[(&str, &str)] = &[
    // cluster.(<cluster_name>.)*
    (CLUSTER_NAME, r"^cluster\.((.*?)\.)"),
    // *_rq(_<response_code>)
    (RESPONSE_CODE, r"_rq(_(\d{3}))$"),
    // *_rq(_<response_code_class>xx)
    (RESPONSE_CODE_CLASS, r"_rq(_(\dxx))$"),
    // http.[<stat_prefix>.]user_agent.(<user_agent>.)<base_stat>
    (HTTP_USER_AGENT, r"^http(?:\..*?)?\.user_agent\.((.*?)\.)\w+?$"),
    // listener.[<address>.]ssl.cipher(.<cipher>)
    (SSL_CIPHER, r"^listener(?:\..*?)?\.ssl\.cipher(\.(.*?))$"),
    // cluster.[<cluster_name>.]ssl.ciphers(.<cipher>)
    (SSL_CIPHER_SUITE, r"^cluster(?:\..*?)?\.ssl\.ciphers(\.(.*?))$"),
    // cluster.[<cluster_name>.]grpc.[<grpc_service>.]<grpc_method>.<base_stat>
    (GRPC_BRIDGE_METHOD, r"^cluster(?:\..*?)?\.grpc\.\w+\.((.*?)\.)"),
    // cluster.[<cluster_name>.]grpc.(<grpc_service>.)*
    (GRPC_BRIDGE_SERVICE, r"^cluster(?:\..*?)?\.grpc\.((.*?)\.)"),
    // vhost.[<virtual host name>.]vcluster.(<virtual_cluster_name>.)<base_stat>
    (VIRTUAL_CLUSTER, r"^vhost(?:\..*?)?\.vcluster\.((.*?)\.)\w+?$"),
    // vhost.(<virtual host name>.)*
    (VIRTUAL_HOST, r"^vhost\.((.*?)\.)"),
    // http.[<stat_prefix>.]fault.(<downstream_cluster>.)<base_stat>
    (FAULT_DOWNSTREAM_CLUSTER, r"^http(?:\..*?)?\.fault\.((.*?)\.)\w+?$"),
    // http.[<stat_prefix>.]dynamodb.table.[<table_name>.]capacity.[<operation_name>.]
    //   (__partition_id=<last_seven_characters_from_partition_id>)
    (
        DYNAMO_PARTITION_ID,
        r"^http(?:\..*?)?\.dynamodb\..+?\.capacity\.\w+?\.(__partition_id=(\w{7}))$",
    ),
    // http.[<stat_prefix>.]dynamodb.operation.(<operation_name>.)<base_stat> or
    // http.[<stat_prefix>.]dynamodb.table.[<table_name>.]capacity.(<operation_name>.)
    (
        DYNAMO_OPERATION,
        r"^http(?:\..*?)?\.dynamodb\.(?:operation|table(?:\..*?)?\.capacity)\.((.*?)\.)",
    ),
    // http.[<stat_prefix>.]dynamodb.table.(<table_name>.)*
    (DYNAMO_TABLE, r"^http(?:\..*?)?\.dynamodb\.table\.((.*?)\.)"),
    // http.(<stat_prefix>.)*
    (HTTP_CONN_MANAGER_PREFIX, r"^http\.((.*?)\.)"),
    // listener.(<address>.)*, ipv4 with '_' as port delimiter or bracketed ipv6
    (LISTENER_ADDRESS, r"^listener\.(((?:[_.0-9]*|[_\[\]a-fA-F0-9:]*))\.)"),
    // mongo.[<stat_prefix>.]collection.[<collection>.]callsite.(<callsite>.)query.<base_stat>
    (MONGO_CALLSITE, r"^mongo(?:\..*?)?\.collection(?:\..*?)?\.callsite\.((.*?)\.).*?query\.\w+?$"),
    // mongo.[<stat_prefix>.]collection.(<collection>.)query.<base_stat>
    (MONGO_COLLECTION, r"^mongo(?:\..*?)?\.collection\.((.*?)\.).*?query\.\w+?$"),
    // mongo.[<stat_prefix>.]cmd.(<cmd>.)<base_stat>
    (MONGO_CMD, r"^mongo(?:\..*?)?\.cmd\.((.*?)\.)\w+?$"),
    // mongo.(<stat_prefix>.)*
    (MONGO_PREFIX, r"^mongo\.((.*?)\.)"),
    // ratelimit.(<stat_prefix>.)*
    (RATELIMIT_PREFIX, r"^ratelimit\.((.*?)\.)"),
    // tcp.(<stat_prefix>.)*
    (TCP_PREFIX, r"^tcp\.((.*?)\.)"),
    // auth.clientssl.(<stat_prefix>.)*
    (CLIENTSSL_PREFIX, r"^auth\.clientssl\.((.*?)\.)"),
];

/// All built-in (tag name, regex) pairs, in application order.
#[inline]
pub fn default_tag_regex() -> &'static [(&'static str, &'static str)] {
    DEFAULT_TAG_REGEX
}

/// The built-in regex for the tag name, if it is a well known one.
pub fn default_regex(tag_name: &str) -> Option<&'static str> {
    DEFAULT_TAG_REGEX
        .iter()
        .find(|(name, _)| *name == tag_name)
        .map(|(_, regex)| *regex)
}
