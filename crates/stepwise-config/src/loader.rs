// SPDX-FileCopyrightText: 2026 Stepwise Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./stepwise.toml` > `~/.config/stepwise/stepwise.toml`
//! > `/etc/stepwise/stepwise.toml`, with environment variable overrides via the
//! `STEPWISE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::StepwiseConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/stepwise/stepwise.toml`
/// 3. `~/.config/stepwise/stepwise.toml`
/// 4. `./stepwise.toml`
/// 5. `STEPWISE_*` environment variables
pub fn load_config() -> Result<StepwiseConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<StepwiseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StepwiseConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StepwiseConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StepwiseConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StepwiseConfig::default()))
        .merge(Toml::file("/etc/stepwise/stepwise.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("stepwise/stepwise.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("stepwise.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")`: `STEPWISE_RUBRIC_DEFAULT_THRESHOLD`
/// must map to `rubric.default_threshold`, not `rubric.default.threshold`.
fn env_provider() -> Env {
    Env::prefixed("STEPWISE_").map(|key| {
        // Keys arrive prefix-stripped but in their original (upper) case.
        let mapped = map_env_key(&key.as_str().to_ascii_lowercase());
        mapped.into()
    })
}

/// Section prefixes recognized in environment variable names.
const ENV_SECTIONS: &[&str] = &[
    "general",
    "storage",
    "generation",
    "notes",
    "rubric",
    "heuristic",
    "suggestions",
];

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_first_underscore_only() {
        assert_eq!(
            map_env_key("rubric_default_threshold"),
            "rubric.default_threshold"
        );
        assert_eq!(map_env_key("generation_api_key"), "generation.api_key");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_override_applies_to_section() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("stepwise.toml", "[notes]\nmax_tokens = 512\n")?;
            jail.set_env("STEPWISE_RUBRIC_DEFAULT_THRESHOLD", "3.0");

            let config = load_config_from_path(Path::new("stepwise.toml"))?;
            assert_eq!(config.notes.max_tokens, 512);
            assert!((config.rubric.default_threshold - 3.0).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn env_override_reaches_layered_loader() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("STEPWISE_GENERATION_API_KEY", "sk-from-env");
            jail.set_env("STEPWISE_NOTES_MILESTONE_INTERVAL", "10");

            let config = load_config()?;
            assert_eq!(config.generation.api_key.as_deref(), Some("sk-from-env"));
            assert_eq!(config.notes.milestone_interval, 10);
            Ok(())
        });
    }
}
