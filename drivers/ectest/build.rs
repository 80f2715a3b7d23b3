// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0

//! Links `ectest` against the WDK selected by `package.metadata.wdk`.

fn main() -> Result<(), wdk_build::ConfigError> {
    wdk_build::configure_wdk_binary_build()
}
