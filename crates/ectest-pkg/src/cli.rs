// Copyright (c) Microsoft Corporation
// License: MIT OR Apache-2.0
//! This module defines the top-level CLI layer, its argument types and
//! structures used for parsing and validating arguments for the `check`,
//! `stamp`, `fmt` and `show` subcommands.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use ectest_inf::{
    Arch,
    ServicePolicy,
    config::{DriverVersion, KmdfVersion},
};
use mockall_double::double;

use crate::actions::{
    check::{CheckAction, CheckActionParams},
    format::FormatAction,
    show::ShowAction,
    stamp::{StampAction, StampActionParams},
};
#[double]
use crate::providers::{fs::Fs, metadata::Metadata};

const ABOUT_STRING: &str = "ectest-pkg checks, formats and stamps the INF install descriptors of \
                            the ectest driver package.";

/// Arguments for the `check` subcommand
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// INF files of one driver package
    #[arg(required = true)]
    pub infs: Vec<PathBuf>,

    /// Hardware id that at least one model must match
    #[arg(long)]
    pub hardware_id: Option<String>,

    /// Crate name the catalog file must be named after
    #[arg(long)]
    pub package_name: Option<String>,

    /// `ServiceType/StartType/ErrorControl` codes every added service must
    /// register
    #[arg(long, default_value_t = ServicePolicy::KERNEL_DRIVER_AT_SYSTEM_START)]
    pub service_policy: ServicePolicy,

    /// Do not check the service registration
    #[arg(long, conflicts_with = "service_policy")]
    pub any_service_policy: bool,
}

/// Arguments for the `stamp` subcommand
#[derive(Debug, Args)]
pub struct StampArgs {
    /// INX template to stamp
    pub inx: PathBuf,

    /// Output path, defaults to the template path with an `.inf` extension
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Target architecture
    #[arg(long, default_value = "amd64")]
    pub arch: Arch,

    /// KMDF version as `major.minor`, defaults to the driver crate's
    /// `package.metadata.wdk.driver-model`
    #[arg(long)]
    pub kmdf_version: Option<KmdfVersion>,

    /// Driver version as `w.x.y.z`, defaults to the driver crate's version
    #[arg(long)]
    pub driver_version: Option<DriverVersion>,

    /// `DriverVer` date as `YYYY-MM-DD`, defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Overrides `CatalogFile`
    #[arg(long)]
    pub catalog: Option<String>,
}

/// Arguments for the `fmt` subcommand
#[derive(Debug, Args)]
pub struct FmtArgs {
    /// INF file to format
    pub inf: PathBuf,

    /// Only report whether the file is formatted
    #[arg(long)]
    pub check: bool,
}

/// Arguments for the `show` subcommand
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// INF file to summarize
    pub inf: PathBuf,
}

/// Subcommands
#[derive(Debug, Subcommand)]
pub enum Subcmd {
    #[clap(name = "check", about = "Validate the INF files of a driver package")]
    Check(CheckArgs),
    #[clap(name = "stamp", about = "Create an INF for one architecture from an INX template")]
    Stamp(StampArgs),
    #[clap(name = "fmt", about = "Rewrite an INF in canonical form")]
    Fmt(FmtArgs),
    #[clap(name = "show", about = "Summarize what an INF installs")]
    Show(ShowArgs),
}

/// Top level command line interface for ectest-pkg
#[derive(Debug, Parser)]
#[clap(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = ABOUT_STRING,
)]
pub struct Cli {
    #[clap(subcommand)]
    pub sub_cmd: Subcmd,
    #[command(flatten)]
    pub verbose: Verbosity,
}

impl Cli {
    /// Entry point method to execute the selected subcommand.
    ///
    /// # Errors
    /// Returns the error of the action that ran.
    pub fn run(self) -> Result<()> {
        let fs = Fs::default();
        let metadata = Metadata::default();

        match self.sub_cmd {
            Subcmd::Check(cli_args) => {
                CheckAction::new(
                    &CheckActionParams {
                        inf_paths: &cli_args.infs,
                        hardware_id: cli_args.hardware_id.as_deref(),
                        package_name: cli_args.package_name.as_deref(),
                        service_policy: (!cli_args.any_service_policy)
                            .then_some(cli_args.service_policy),
                    },
                    &fs,
                )
                .run()?;
            }
            Subcmd::Stamp(cli_args) => {
                let params = StampActionParams {
                    inx_path: &cli_args.inx,
                    output: cli_args.output.as_deref(),
                    arch: cli_args.arch,
                    kmdf_version: cli_args.kmdf_version,
                    driver_version: cli_args.driver_version,
                    date: cli_args
                        .date
                        .unwrap_or_else(|| Local::now().date_naive()),
                    catalog_file: cli_args.catalog.as_deref(),
                };
                StampAction::new(&params, &fs, &metadata).run()?;
            }
            Subcmd::Fmt(cli_args) => {
                FormatAction::new(&cli_args.inf, cli_args.check, &fs).run()?;
            }
            Subcmd::Show(cli_args) => {
                let summary = ShowAction::new(&cli_args.inf, &fs).run()?;
                print!("{summary}");
            }
        }
        Ok(())
    }
}
