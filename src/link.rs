// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Dotfile linking logic.
//!
//! The [`Linker`] walks through a [`LinkSpec`] in declaration order, and
//! places a symlink at each destination that points back into the dotfile
//! repository. Linking an entry goes through four steps:
//!
//! 1. Check that the source fragment names a regular file in the repository.
//! 2. Create the destination's parent directory, along with any missing
//!    ancestors.
//! 3. Remove whatever non-directory entry already sits at the destination,
//!    dangling symlinks included.
//! 4. Create the symlink.
//!
//! Each step is attempted once. A step that fails ends processing of its entry
//! only, and the failure is recorded in that entry's [`EntryOutcome`]. The
//! remaining entries are always processed. Running the linker twice against
//! an unchanged repository leaves the file system in the same state as running
//! it once.
//!
//! # Directory Obstruction
//!
//! A destination that is a real directory, not a symlink to one, is never
//! removed. Link creation is still attempted, and is expected to fail. The
//! resulting [`LinkError::LinkFailed`] is flagged as obstructed by a directory
//! so the caller can tell this case apart from other link failures.

use crate::{
    config::{LinkEntry, LinkSpec},
    report::{ReportError, Transcript},
};

use std::{
    fs::{self, Metadata},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

/// Symlink dotfiles from a repository root into their destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linker {
    repo_root: PathBuf,
}

impl Linker {
    /// Construct new linker for target repository root.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    pub fn repo_root(&self) -> &Path {
        self.repo_root.as_path()
    }

    /// Link every entry of link specification, and report progress to
    /// transcript.
    ///
    /// Writes the transcript banner, one line per entry as soon as that entry
    /// is processed, and the closing banner. Once a write to the transcript
    /// fails, the transcript is abandoned, but the remaining entries are still
    /// linked.
    ///
    /// # Errors
    ///
    /// - Return [`ReportError`] if the transcript could not be written to,
    ///   after every entry has been processed. Entry failures are never
    ///   returned as errors, they are recorded in the returned [`LinkReport`]
    ///   instead.
    #[instrument(skip(self, spec, transcript), level = "debug")]
    pub fn run<W: Write>(
        &self,
        spec: &LinkSpec,
        transcript: &mut Transcript<W>,
    ) -> Result<LinkReport, ReportError> {
        let mut write_failure = transcript.banner(&self.repo_root).err();

        let mut report = LinkReport::default();
        for entry in spec {
            let outcome = self.link_entry(entry);
            // INVARIANT: Transcript failures never stop linking.
            if write_failure.is_none() {
                write_failure = transcript.entry(&outcome).err();
            }
            report.outcomes.push(outcome);
        }

        if write_failure.is_none() {
            write_failure = transcript.footer().err();
        }

        debug!(
            "linked {} of {} entries",
            report.linked_count(),
            report.len()
        );

        match write_failure {
            Some(error) => {
                warn!("transcript abandoned after write failure: {error}");
                Err(error)
            }
            None => Ok(report),
        }
    }

    /// Link every entry of link specification without any console output.
    pub fn link_all(&self, spec: &LinkSpec) -> LinkReport {
        LinkReport {
            outcomes: spec.iter().map(|entry| self.link_entry(entry)).collect(),
        }
    }

    /// Link a single entry.
    #[instrument(
        skip(self, entry),
        fields(source = %entry.source, destination = %entry.destination.display()),
        level = "debug"
    )]
    pub fn link_entry(&self, entry: &LinkEntry) -> EntryOutcome {
        let mut outcome = EntryOutcome {
            source_path: entry.source_path(&self.repo_root),
            entry: entry.clone(),
            created_directory: None,
            removed_existing: false,
            result: Ok(()),
        };
        outcome.result = link_steps(&mut outcome);

        match &outcome.result {
            Ok(()) => debug!("symlinked {}", outcome.source_path.display()),
            Err(error) => debug!("failed: {error}"),
        }

        outcome
    }
}

fn link_steps(outcome: &mut EntryOutcome) -> Result<()> {
    let source_path = outcome.source_path.clone();
    let destination = outcome.entry.destination.clone();

    // INVARIANT: Source must be a regular file, or a symlink to one.
    if !source_path.is_file() {
        return Err(LinkError::SourceMissing { source_path });
    }

    if let Some(parent) = destination.parent().filter(|parent| !parent.is_dir()) {
        debug!("create missing directory {}", parent.display());
        outcome.created_directory =
            mkdirp::mkdirp(parent).map_err(|source| LinkError::DirectoryCreateFailed {
                source,
                directory: parent.to_path_buf(),
            })?;
    }

    let mut obstructed_by_directory = false;
    match fs::symlink_metadata(&destination) {
        // INVARIANT: Never remove real directories, only symlinks to them.
        Ok(metadata) if metadata.is_dir() => {
            warn!(
                "{} is a directory, leaving it in place",
                destination.display()
            );
            obstructed_by_directory = true;
        }
        Ok(metadata) => {
            debug!("remove existing entry at {}", destination.display());
            remove_entry(&destination, &metadata).map_err(|source| LinkError::RemoveFailed {
                source,
                destination: destination.clone(),
            })?;
            outcome.removed_existing = true;
        }
        Err(error) if error.kind() == ErrorKind::NotFound => {
            debug!("nothing to remove at {}", destination.display());
        }
        Err(error) => {
            debug!("cannot inspect {}: {error}", destination.display());
        }
    }

    symlink(&source_path, &destination).map_err(|source| {
        if obstructed_by_directory {
            warn!(
                "cannot link over directory {}: {source}",
                destination.display()
            );
        }

        LinkError::LinkFailed {
            source,
            obstructed_by_directory,
        }
    })
}

#[cfg(unix)]
fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(source, destination)
}

#[cfg(windows)]
fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(source, destination)
}

#[cfg(unix)]
fn remove_entry(path: &Path, _metadata: &Metadata) -> io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_entry(path: &Path, metadata: &Metadata) -> io::Result<()> {
    use std::os::windows::fs::FileTypeExt;

    if metadata.file_type().is_symlink_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

/// Result of linking a single entry.
#[derive(Debug)]
pub struct EntryOutcome {
    /// Entry that was processed.
    pub entry: LinkEntry,

    /// Source fragment resolved against repository root.
    pub source_path: PathBuf,

    /// First directory that had to be created for destination's parent, if
    /// any were created.
    pub created_directory: Option<PathBuf>,

    /// Whether an existing entry at destination was removed.
    pub removed_existing: bool,

    /// Final result of linking.
    pub result: Result<()>,
}

impl EntryOutcome {
    pub fn status(&self) -> LinkStatus {
        match &self.result {
            Ok(()) => LinkStatus::Linked,
            Err(LinkError::SourceMissing { .. }) => LinkStatus::SourceMissing,
            Err(LinkError::DirectoryCreateFailed { .. }) => LinkStatus::DirectoryCreateFailed,
            Err(LinkError::RemoveFailed { .. }) => LinkStatus::RemoveFailed,
            Err(LinkError::LinkFailed { .. }) => LinkStatus::LinkFailed,
        }
    }

    pub fn is_linked(&self) -> bool {
        self.result.is_ok()
    }
}

/// Condensed status of an [`EntryOutcome`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    Linked,
    SourceMissing,
    DirectoryCreateFailed,
    RemoveFailed,
    LinkFailed,
}

/// Ordered listing of entry outcomes for a whole run.
#[derive(Debug, Default)]
pub struct LinkReport {
    outcomes: Vec<EntryOutcome>,
}

impl LinkReport {
    /// Iterate through outcomes in the order entries were processed.
    pub fn iter(&self) -> std::slice::Iter<'_, EntryOutcome> {
        self.outcomes.iter()
    }

    /// Iterate through failed outcomes only.
    pub fn failures(&self) -> impl Iterator<Item = &EntryOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_linked())
    }

    pub fn statuses(&self) -> Vec<LinkStatus> {
        self.outcomes.iter().map(EntryOutcome::status).collect()
    }

    pub fn linked_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.is_linked()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.len() - self.linked_count()
    }

    /// Every entry was linked.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl<'report> IntoIterator for &'report LinkReport {
    type Item = &'report EntryOutcome;
    type IntoIter = std::slice::Iter<'report, EntryOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Per-entry link failures.
///
/// Display text doubles as the failure reason shown in the transcript.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// Source fragment does not name a regular file in repository.
    #[error("Source not found: {}", source_path.display())]
    SourceMissing { source_path: PathBuf },

    /// Parent directory of destination cannot be created.
    #[error("Could not create directory: {} - {source}", directory.display())]
    DirectoryCreateFailed {
        #[source]
        source: io::Error,
        directory: PathBuf,
    },

    /// Existing entry at destination cannot be removed.
    #[error("Could not remove existing file: {source}")]
    RemoveFailed {
        #[source]
        source: io::Error,
        destination: PathBuf,
    },

    /// Symlink cannot be created at destination.
    #[error("Link creation failed: {source}")]
    LinkFailed {
        #[source]
        source: io::Error,

        /// Destination is a real directory that was left in place.
        obstructed_by_directory: bool,
    },
}

/// Friendly result alias :3
type Result<T, E = LinkError> = std::result::Result<T, E>;
