// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `homeprobe` command line.
//!
//! Usage:
//!   homeprobe yolink auth
//!   homeprobe govee poll --interval 5
//!   homeprobe hue listen

mod govee;
mod hue;
mod ticker;
mod yolink;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use homeprobe::credentials::CredentialStore;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "homeprobe")]
#[command(about = "Probe YoLink, Govee and Philips Hue cloud APIs for device state changes")]
#[command(version)]
struct Cli {
    /// Credential file; tokens obtained by `auth` commands are appended to it
    #[arg(long, global = true, env = "HOMEPROBE_ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    vendor: Vendor,
}

#[derive(Subcommand)]
enum Vendor {
    /// YoLink door sensors (MQTT push)
    #[command(subcommand)]
    Yolink(yolink::Command),
    /// Govee lights and sensors (polling and MQTT events)
    #[command(subcommand)]
    Govee(govee::Command),
    /// Philips Hue lights and sensors (polling)
    #[command(subcommand)]
    Hue(hue::Command),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match CredentialStore::load(&cli.env_file) {
        Ok(mut store) => match cli.vendor {
            Vendor::Yolink(command) => yolink::run(command, &mut store).await,
            Vendor::Govee(command) => govee::run(command, &store).await,
            Vendor::Hue(command) => hue::run(command, &mut store).await,
        },
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "homeprobe failed");
            ExitCode::FAILURE
        }
    }
}
