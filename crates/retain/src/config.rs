use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use crate::{HandoffListener, Listener, NONE};

pub const MODE_ENV: &str = "RETAIN_ANALYSIS";
pub const HANDOFF_DIR_ENV: &str = "RETAIN_HANDOFF_DIR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnalysisMode {
    #[default]
    Disabled,
    Handoff,
}

impl AnalysisMode {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("off") {
            return Ok(Self::Disabled);
        }
        if trimmed.eq_ignore_ascii_case("handoff") {
            return Ok(Self::Handoff);
        }
        Err(ConfigError::UnknownMode(value.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    UnknownMode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownMode(value) => {
                write!(f, "{MODE_ENV}={value:?} is not one of: off, handoff")
            }
        }
    }
}

impl Error for ConfigError {}

/// Chooses which listener a watcher hands its heap dumps to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
    /// Override directory for hand-off files. `None` writes beside each snapshot.
    pub handoff_dir: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = match lookup(MODE_ENV) {
            Some(value) => AnalysisMode::parse(&value)?,
            None => AnalysisMode::Disabled,
        };
        let handoff_dir = lookup(HANDOFF_DIR_ENV)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        Ok(Self { mode, handoff_dir })
    }

    pub fn into_listener(self) -> Box<dyn Listener> {
        match self.mode {
            AnalysisMode::Disabled => Box::new(NONE),
            AnalysisMode::Handoff => match self.handoff_dir {
                Some(dir) => Box::new(HandoffListener::in_dir(dir)),
                None => Box::new(HandoffListener::beside_snapshot()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| env.get(key).cloned()
    }

    #[test]
    fn unset_environment_disables_analysis() {
        let config = AnalysisConfig::from_lookup(lookup(&[])).expect("empty env must parse");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn handoff_mode_with_dir() {
        let config = AnalysisConfig::from_lookup(lookup(&[
            (MODE_ENV, " HandOff "),
            (HANDOFF_DIR_ENV, "/data/leaks"),
        ]))
        .expect("handoff env must parse");
        assert_eq!(config.mode, AnalysisMode::Handoff);
        assert_eq!(config.handoff_dir, Some(PathBuf::from("/data/leaks")));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = AnalysisConfig::from_lookup(lookup(&[(MODE_ENV, "  "), (HANDOFF_DIR_ENV, "")]))
            .expect("blank env must parse");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let err = AnalysisConfig::from_lookup(lookup(&[(MODE_ENV, "upload")]))
            .expect_err("unknown mode must fail");
        assert_eq!(err, ConfigError::UnknownMode("upload".into()));
    }

    #[test]
    fn only_off_and_handoff_are_accepted() {
        let off = AnalysisConfig::from_lookup(lookup(&[(MODE_ENV, "OFF")])).expect("off must parse");
        assert_eq!(off.mode, AnalysisMode::Disabled);

        let err = AnalysisConfig::from_lookup(lookup(&[(MODE_ENV, "none")]))
            .expect_err("none is not a mode");
        assert_eq!(err, ConfigError::UnknownMode("none".into()));
        assert_eq!(err.to_string(), "RETAIN_ANALYSIS=\"none\" is not one of: off, handoff");
    }
}
