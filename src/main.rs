// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dotlink::{default_repo_root, LinkSpec, Linker, Transcript};

use anyhow::Result;
use clap::Parser;
use std::{io::stdout, process::exit};
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Symlink dotfiles from "~/src/pi500-dotfiles" into the home directory.
#[derive(Debug, Clone, Parser)]
#[command(about, version)]
struct Cli {}

impl Cli {
    fn run(self) -> Result<()> {
        let spec = LinkSpec::builtin()?;
        let linker = Linker::new(default_repo_root()?);
        let mut transcript = Transcript::new(stdout().lock());
        let report = linker.run(&spec, &mut transcript)?;

        // INVARIANT: Entry failures never change the exit status.
        debug!(
            "{} linked, {} failed",
            report.linked_count(),
            report.failed_count()
        );

        Ok(())
    }
}

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = run() {
        error!("{error:?}");
        exit(1);
    }

    exit(0)
}

fn run() -> Result<()> {
    Cli::parse().run()
}
