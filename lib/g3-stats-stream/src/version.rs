/*
 * SPDX-License-Identifier: Apache-2.0
 * Copyright 2025 ByteDance and/or its affiliates.
 */

//! Build version of this library, reported along with the node identity.

const VERSION_NUMBER: &str = env!("CARGO_PKG_VERSION");

const BUILD_REVISION: Option<&str> = option_env!("G3_BUILD_REVISION");
const BUILD_REVISION_STATUS: Option<&str> = option_env!("G3_BUILD_REVISION_STATUS");

#[inline]
pub fn version_number() -> &'static str {
    VERSION_NUMBER
}

/// The source revision, set by the packaging scripts.
pub fn revision() -> &'static str {
    BUILD_REVISION.unwrap_or("unknown")
}

/// Whether the source tree was modified at build time.
pub fn revision_status() -> &'static str {
    BUILD_REVISION_STATUS.unwrap_or("unknown")
}

pub fn build_type() -> &'static str {
    if cfg!(debug_assertions) {
        "DEBUG"
    } else {
        "RELEASE"
    }
}

/// `<version>/<revision>/<revision status>/<build type>`
pub fn version() -> String {
    format!(
        "{}/{}/{}/{}",
        version_number(),
        revision(),
        revision_status(),
        build_type()
    )
}
