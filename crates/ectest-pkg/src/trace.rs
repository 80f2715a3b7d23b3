// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! Configures the tracing subscriber from the verbosity flags given on the
//! command line.

use clap_verbosity_flag::{Verbosity, VerbosityFilter};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber with a filter based on clap's verbosity
/// level.
pub fn init_tracing(verbosity_level: Verbosity) {
    let level = level_filter(verbosity_level);
    let tracing_filter = EnvFilter::default().add_directive(level.into());

    tracing_subscriber::fmt()
        .compact()
        .without_time()
        .with_target(false)
        .with_file(false)
        .with_env_filter(tracing_filter)
        .init();
}

/// Shifts clap's default of `Error` up to INFO, so that
/// * no flag logs at INFO
/// * `-v` logs at DEBUG
/// * `-vv` and above log at TRACE
/// * `-q` turns logging off
fn level_filter(verbosity_level: Verbosity) -> LevelFilter {
    match verbosity_level.filter() {
        VerbosityFilter::Off => LevelFilter::OFF,
        VerbosityFilter::Error => LevelFilter::INFO,
        VerbosityFilter::Warn => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
