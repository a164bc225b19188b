// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the __link specification__ that decides which
//! dotfiles get linked, and where they get linked to. The link specification
//! that the binary uses is embedded at compile time from `links.toml`, so the
//! mapping is fixed for the entire lifetime of a run. There is no config file
//! to look up at run time.
//!
//! # General Layout
//!
//! A link specification is an array of `link` tables. Each table pairs a
//! source fragment with a destination path:
//!
//! ```toml
//! [[link]]
//! source = "config/labwc/rc.xml"
//! destination = "~/.config/labwc/rc.xml"
//! ```
//!
//! The source fragment is resolved against the repository root, so it must be
//! relative and must not climb out of the repository. The destination is shell
//! expanded, and must be absolute afterwards. Table order is preserved, and
//! determines the order entries are processed and reported in.

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::{Component, Path, PathBuf},
    slice::Iter,
    str::FromStr,
};

const BUILTIN_LINK_SPEC: &str = include_str!("../links.toml");

/// Ordered listing of dotfiles to link.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct LinkSpec {
    /// Link entries in declaration order.
    #[serde(rename = "link", default)]
    pub entries: Vec<LinkEntry>,
}

impl LinkSpec {
    /// Load link specification embedded into the binary.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError`] if embedded specification is malformed, or
    ///   shell expansion of a destination fails.
    pub fn builtin() -> Result<Self> {
        BUILTIN_LINK_SPEC.parse()
    }

    /// Iterate through link entries in declaration order.
    pub fn iter(&self) -> Iter<'_, LinkEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'spec> IntoIterator for &'spec LinkSpec {
    type Item = &'spec LinkEntry;
    type IntoIter = Iter<'spec, LinkEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromStr for LinkSpec {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut spec: LinkSpec = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        for entry in &mut spec.entries {
            // INVARIANT: Perform shell expansion on destination field.
            entry.destination = PathBuf::from(
                shellexpand::full(entry.destination.to_string_lossy().as_ref())
                    .map_err(ConfigError::ShellExpansion)?
                    .into_owned(),
            );
            entry.validate()?;
        }

        Ok(spec)
    }
}

impl Display for LinkSpec {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Single dotfile to link.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct LinkEntry {
    /// Path fragment of dotfile relative to repository root.
    pub source: String,

    /// Absolute path the symlink is placed at.
    pub destination: PathBuf,
}

impl LinkEntry {
    /// Construct new link entry.
    ///
    /// No validation or shell expansion is performed.
    pub fn new(source: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    /// Resolve source fragment against repository root.
    pub fn source_path(&self, repo_root: impl AsRef<Path>) -> PathBuf {
        repo_root.as_ref().join(&self.source)
    }

    fn validate(&self) -> Result<()> {
        let fragment = Path::new(&self.source);
        let escapes = fragment.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if self.source.is_empty() || escapes {
            return Err(ConfigError::InvalidSource {
                fragment: self.source.clone(),
            });
        }

        if !self.destination.is_absolute() {
            return Err(ConfigError::RelativeDestination {
                destination: self.destination.clone(),
            });
        }

        Ok(())
    }
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Source fragment is empty, absolute, or climbs out of repository root.
    #[error("source fragment {fragment:?} must be a relative path inside the repository")]
    InvalidSource { fragment: String },

    /// Destination is still relative after shell expansion.
    #[error("destination {:?} must be an absolute path", destination.display())]
    RelativeDestination { destination: PathBuf },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::{formatdoc, indoc};
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use simple_test_case::test_case;

    #[sealed_test(env = [("HOME", "/home/pi"), ("DOTS", "/srv/dots")])]
    fn deserialize_link_spec() -> anyhow::Result<()> {
        let result: LinkSpec = r#"
            [[link]]
            source = "bash_aliases"
            destination = "~/.bash_aliases"

            [[link]]
            source = "config/labwc/rc.xml"
            destination = "$DOTS/labwc/rc.xml"
        "#
        .parse()?;

        let expect = LinkSpec {
            entries: vec![
                LinkEntry::new("bash_aliases", "/home/pi/.bash_aliases"),
                LinkEntry::new("config/labwc/rc.xml", "/srv/dots/labwc/rc.xml"),
            ],
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn serialize_link_spec() {
        let result = LinkSpec {
            entries: vec![LinkEntry::new("gitconfig", "/home/pi/.gitconfig")],
        }
        .to_string();

        let expect = indoc! {r#"
            [[link]]
            source = "gitconfig"
            destination = "/home/pi/.gitconfig"
        "#};

        assert_eq!(result, expect);
    }

    #[sealed_test(env = [("HOME", "/home/pi")])]
    fn builtin_link_spec_keeps_declaration_order() -> anyhow::Result<()> {
        let spec = LinkSpec::builtin()?;
        let result = spec
            .iter()
            .map(|entry| (entry.source.as_str(), entry.destination.clone()))
            .collect::<Vec<_>>();

        let expect = vec![
            ("bash_aliases", PathBuf::from("/home/pi/.bash_aliases")),
            ("config/labwc/rc.xml", PathBuf::from("/home/pi/.config/labwc/rc.xml")),
            ("gitconfig", PathBuf::from("/home/pi/.gitconfig")),
            ("tmux.conf", PathBuf::from("/home/pi/.tmux.conf")),
            ("vilerc", PathBuf::from("/home/pi/.vilerc")),
            ("vimrc", PathBuf::from("/home/pi/.vimrc")),
        ];

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn empty_link_spec() -> anyhow::Result<()> {
        let spec: LinkSpec = "".parse()?;
        assert!(spec.is_empty());
        assert_eq!(spec.len(), 0);

        Ok(())
    }

    #[test_case("/etc/passwd"; "absolute fragment")]
    #[test_case("../outside/gitconfig"; "parent traversal")]
    #[test_case("config/../../gitconfig"; "nested parent traversal")]
    #[test_case(""; "empty fragment")]
    #[test]
    fn reject_invalid_source_fragment(fragment: &str) {
        let data = formatdoc! {r#"
            [[link]]
            source = "{fragment}"
            destination = "/home/pi/.gitconfig"
        "#, fragment = fragment};

        let result = data.parse::<LinkSpec>();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidSource { fragment: ref bad }) if bad == fragment
        ));
    }

    #[test]
    fn reject_relative_destination() {
        let result = indoc! {r#"
            [[link]]
            source = "gitconfig"
            destination = "dotfiles/.gitconfig"
        "#}
        .parse::<LinkSpec>();

        assert!(matches!(result, Err(ConfigError::RelativeDestination { .. })));
    }

    #[test]
    fn resolve_source_against_repo_root() {
        let entry = LinkEntry::new("config/labwc/rc.xml", "/home/pi/.config/labwc/rc.xml");
        assert_eq!(
            entry.source_path("/home/pi/src/pi500-dotfiles"),
            PathBuf::from("/home/pi/src/pi500-dotfiles/config/labwc/rc.xml")
        );
    }
}
