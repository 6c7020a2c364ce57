// src/config/validate.rs

use std::net::IpAddr;
use std::str::FromStr;

use globset::Glob;

use crate::config::model::ConfigFile;
use crate::errors::{GustError, Result};
use crate::pipeline::OutputMode;

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `dest` is non-empty
/// - the transform has at least one source pattern and a command
/// - all glob patterns (sources and excludes) compile
/// - the command template carries the placeholders its mode substitutes
/// - per-file artifacts get a usable extension
/// - the serve host parses and the port is nonzero
///
/// It does **not** check that any pattern currently matches files; an empty
/// source set is a valid (no-op) build.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_dest(cfg)?;
    validate_transform(cfg)?;
    validate_assets(cfg)?;
    validate_serve(cfg)?;
    Ok(())
}

fn validate_dest(cfg: &ConfigFile) -> Result<()> {
    if cfg.build.dest.trim().is_empty() {
        return Err(GustError::Config(
            "[build].dest must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_transform(cfg: &ConfigFile) -> Result<()> {
    let t = &cfg.build.transform;

    if t.sources.is_empty() {
        return Err(GustError::Config(
            "[build.transform].sources must contain at least one pattern".to_string(),
        ));
    }
    validate_globs("[build.transform].sources", &t.sources)?;
    validate_globs("[build.transform].exclude", &t.exclude)?;

    if t.command.trim().is_empty() {
        return Err(GustError::Config(
            "[build.transform].command must not be empty".to_string(),
        ));
    }

    let mode = OutputMode::from_str(&t.mode)
        .map_err(|e| GustError::Config(format!("invalid [build.transform].mode: {e}")))?;

    match mode {
        OutputMode::PerFile => {
            if t.command.contains("{inputs}") {
                return Err(GustError::Config(
                    "per-file mode substitutes {input}, not {inputs}; \
                     set mode = \"bundle\" for a whole-set command"
                        .to_string(),
                ));
            }
            for placeholder in ["{input}", "{output}"] {
                if !t.command.contains(placeholder) {
                    return Err(GustError::Config(format!(
                        "[build.transform].command must contain {placeholder} in per-file mode"
                    )));
                }
            }
            if t.extension.trim().is_empty() {
                return Err(GustError::Config(
                    "[build.transform].extension must not be empty".to_string(),
                ));
            }
            if t.extension.starts_with('.') {
                return Err(GustError::Config(format!(
                    "[build.transform].extension must not include the leading dot (got {:?})",
                    t.extension
                )));
            }
        }
        OutputMode::Bundle => {
            if !t.command.contains("{output}") {
                return Err(GustError::Config(
                    "[build.transform].command must contain {output} in bundle mode".to_string(),
                ));
            }
            if t.bundle.trim().is_empty() {
                return Err(GustError::Config(
                    "[build.transform].bundle must not be empty".to_string(),
                ));
            }
        }
    }

    Ok(())
}

fn validate_assets(cfg: &ConfigFile) -> Result<()> {
    let Some(assets) = &cfg.build.assets else {
        return Ok(());
    };

    if assets.sources.is_empty() {
        return Err(GustError::Config(
            "[build.assets].sources must contain at least one pattern".to_string(),
        ));
    }
    validate_globs("[build.assets].sources", &assets.sources)?;
    validate_globs("[build.assets].exclude", &assets.exclude)?;

    Ok(())
}

fn validate_serve(cfg: &ConfigFile) -> Result<()> {
    if cfg.serve.host.parse::<IpAddr>().is_err() {
        return Err(GustError::Config(format!(
            "[serve].host is not a valid IP address: {:?}",
            cfg.serve.host
        )));
    }
    if cfg.serve.port == 0 {
        return Err(GustError::Config(
            "[serve].port must be nonzero".to_string(),
        ));
    }
    Ok(())
}

fn validate_globs(field: &str, patterns: &[String]) -> Result<()> {
    for pat in patterns {
        Glob::new(pat)
            .map_err(|e| GustError::Config(format!("{field}: invalid glob pattern '{pat}': {e}")))?;
    }
    Ok(())
}
