// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the skip adapter.
//!
//! The embedded [default config](AdapterConfig::DEFAULT_CONFIG) is always loaded first. A
//! repository can then override it with a TOML file at
//! [`.config/skip-adapter.toml`](AdapterConfig::CONFIG_PATH), or with an explicitly specified
//! file.

use crate::{
    display_name::DisplayNameFormatter,
    errors::{ConfigParseError, ConfigParseErrorKind},
    skip::SKIP_SENTINEL,
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, builder::DefaultState};
use serde::Deserialize;
use smol_str::SmolStr;
use std::collections::BTreeSet;
use tracing::warn;

/// Overall configuration for the skip adapter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AdapterConfig {
    sentinel: SmolStr,
    display_name: DisplayNameFormatter,
}

impl AdapterConfig {
    /// The default location of the config within the workspace root.
    pub const CONFIG_PATH: &'static str = ".config/skip-adapter.toml";

    /// Contents of the default config, as embedded in this library.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the adapter config from the given file, or if not specified from
    /// `.config/skip-adapter.toml` in the workspace root.
    ///
    /// Unknown keys are logged as warnings.
    pub fn from_sources(
        workspace_root: impl AsRef<Utf8Path>,
        config_file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        Self::from_sources_with_unknown_callback(
            workspace_root,
            config_file,
            |config_file, unknown| {
                warn!(
                    "ignoring unknown configuration keys in config file {config_file}: {}",
                    unknown.iter().cloned().collect::<Vec<_>>().join(", "),
                );
            },
        )
    }

    /// Like [`Self::from_sources`], but reports unknown keys to `unknown_callback` instead of
    /// logging them.
    pub fn from_sources_with_unknown_callback(
        workspace_root: impl AsRef<Utf8Path>,
        config_file: Option<&Utf8Path>,
        mut unknown_callback: impl FnMut(&Utf8Path, &BTreeSet<String>),
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match config_file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = workspace_root.as_ref().join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        let builder = Self::make_default_config().add_source(source);
        let (deserialized, unknown) = Self::build_and_deserialize_config(&builder)
            .map_err(|kind| ConfigParseError::new(config_file.clone(), kind))?;
        if !unknown.is_empty() {
            unknown_callback(&config_file, &unknown);
        }

        deserialized
            .into_config()
            .map_err(|kind| ConfigParseError::new(config_file, kind))
    }

    /// Returns the default config.
    pub fn default_config() -> Self {
        let (deserialized, unknown) =
            Self::build_and_deserialize_config(&Self::make_default_config())
                .expect("default config is always valid");
        debug_assert!(
            unknown.is_empty(),
            "found unknown keys in default config: {unknown:?}"
        );
        deserialized
            .into_config()
            .expect("default config is always valid")
    }

    /// Creates a config directly from its parts.
    pub fn new(sentinel: impl Into<SmolStr>, display_name: DisplayNameFormatter) -> Self {
        Self {
            sentinel: sentinel.into(),
            display_name,
        }
    }

    /// Returns the failure kind that marks a skip request.
    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Returns the formatter used for display names.
    pub fn display_name(&self) -> &DisplayNameFormatter {
        &self.display_name
    }

    // ---
    // Helper methods
    // ---

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// This returns a tuple of (config, ignored paths).
    fn build_and_deserialize_config(
        builder: &ConfigBuilder<DefaultState>,
    ) -> Result<(AdapterConfigDeserialize, BTreeSet<String>), ConfigParseErrorKind> {
        let config = builder
            .build_cloned()
            .map_err(|error| ConfigParseErrorKind::BuildError(Box::new(error)))?;

        let mut ignored = BTreeSet::new();
        let mut cb = |path: serde_ignored::Path| {
            ignored.insert(path.to_string());
        };
        let ignored_de = serde_ignored::Deserializer::new(config, &mut cb);
        let config: AdapterConfigDeserialize = serde_path_to_error::deserialize(ignored_de)
            .map_err(|error| {
                // Both serde_path_to_error and the config crate report the key. Drop the key
                // from the config error so it's only printed once.
                let path = error.path().clone();
                let config_error = error.into_inner();
                let error = match config_error {
                    ConfigError::At { error, .. } => *error,
                    other => other,
                };
                ConfigParseErrorKind::DeserializeError(Box::new(serde_path_to_error::Error::new(
                    path, error,
                )))
            })?;

        Ok((config, ignored))
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self::new(SKIP_SENTINEL, DisplayNameFormatter::none())
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AdapterConfigDeserialize {
    skip: SkipConfigDeserialize,
    #[serde(default)]
    display_name: DisplayNameConfigDeserialize,
}

impl AdapterConfigDeserialize {
    fn into_config(self) -> Result<AdapterConfig, ConfigParseErrorKind> {
        let sentinel = self.skip.sentinel;
        // Compared byte-for-byte with failure kinds, so it is never normalized.
        if sentinel.is_empty() || sentinel.trim() != sentinel {
            return Err(ConfigParseErrorKind::InvalidSentinel);
        }
        Ok(AdapterConfig::new(
            sentinel,
            DisplayNameFormatter::new(self.display_name.strip_prefix),
        ))
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct SkipConfigDeserialize {
    sentinel: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DisplayNameConfigDeserialize {
    #[serde(default)]
    strip_prefix: Option<String>,
}
