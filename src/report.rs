// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Console transcript of a linking run.
//!
//! The transcript is the only place users learn which entries failed. It
//! opens with a banner naming the repository root, prints one line per entry
//! in processing order, and closes with a completion banner. Each entry line
//! looks like:
//!
//! ```text
//! Processing config/labwc/rc.xml -> /home/pi/.config/labwc/rc.xml... Directory created, DONE (Symlinked)
//! ```

use crate::link::EntryOutcome;

use std::{io::Write, path::Path};

const RULE: &str = "-----------------------------------";

/// Write linking progress to an output stream.
#[derive(Debug)]
pub struct Transcript<W: Write> {
    out: W,
}

impl<W: Write> Transcript<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Give back the underlying output stream.
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write opening banner.
    ///
    /// # Errors
    ///
    /// - Return [`ReportError::Write`] if output stream cannot be written to.
    pub fn banner(&mut self, repo_root: &Path) -> Result<()> {
        writeln!(self.out, "Starting dotfiles symlink process...")?;
        writeln!(self.out, "Source Repository: {}", repo_root.display())?;
        writeln!(self.out, "{RULE}")?;

        Ok(())
    }

    /// Write progress line for a processed entry.
    ///
    /// # Errors
    ///
    /// - Return [`ReportError::Write`] if output stream cannot be written to.
    pub fn entry(&mut self, outcome: &EntryOutcome) -> Result<()> {
        write!(
            self.out,
            "Processing {} -> {}... ",
            outcome.entry.source,
            outcome.entry.destination.display()
        )?;

        if outcome.created_directory.is_some() {
            write!(self.out, "Directory created, ")?;
        }

        if outcome.removed_existing {
            write!(self.out, "Existing removed, ")?;
        }

        match &outcome.result {
            Ok(()) => writeln!(self.out, "DONE (Symlinked)")?,
            Err(error) => writeln!(self.out, "FAIL ({error})")?,
        }

        // INVARIANT: Entry lines show up as soon as the entry is done.
        self.out.flush()?;

        Ok(())
    }

    /// Write closing banner.
    ///
    /// # Errors
    ///
    /// - Return [`ReportError::Write`] if output stream cannot be written to.
    pub fn footer(&mut self) -> Result<()> {
        writeln!(self.out, "{RULE}")?;
        writeln!(
            self.out,
            "Symlinking complete. Please run 'source ~/.bashrc' or open a new terminal."
        )?;
        self.out.flush()?;

        Ok(())
    }
}

/// Transcript error types.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Output stream cannot be written to.
    #[error("failed to write transcript")]
    Write(#[from] std::io::Error),
}

/// Friendly result alias :3
type Result<T, E = ReportError> = std::result::Result<T, E>;
