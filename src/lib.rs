// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Link dotfiles from a repository into the home directory.
//!
//! A fixed [`LinkSpec`] pairs source fragments inside the dotfile repository
//! with absolute destinations. The [`Linker`] places a symlink at each
//! destination that points back into the repository, replacing whatever file
//! or link used to be there. Real directories are never replaced.
//!
//! Failures are local to the entry they happen on. Every entry is processed,
//! and the outcome of each one is recorded in a [`LinkReport`], and printed
//! through a [`Transcript`].

pub mod config;
pub mod link;
pub mod path;
pub mod report;

pub use config::{ConfigError, LinkEntry, LinkSpec};
pub use link::{EntryOutcome, LinkError, LinkReport, LinkStatus, Linker};
pub use path::{default_repo_root, home_dir, NoWayHome};
pub use report::{ReportError, Transcript};
