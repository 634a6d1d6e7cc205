// ABOUTME: Config values that are literal or read from the environment.
// ABOUTME: Lets one config file serve every account the handlers run in.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Literal(s) => f.write_str(s),
            EnvValue::FromEnv { var, .. } => write!(f, "${}", var),
        }
    }
}

/// Resolve an optional value; an unset optional stays `None`.
pub fn resolve_optional(value: Option<&EnvValue>) -> Result<Option<String>> {
    value.map(EnvValue::resolve).transpose()
}
