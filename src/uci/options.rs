//! Engine option descriptors.
//!
//! The shape of an option an engine advertises with `option name ...`.
//! Turning advertisement lines into these values is left to a parser built
//! on top; this module only guarantees the descriptors are well formed.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::OptionError;

/// Option type as named by the protocol's `type` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OptionKind {
    /// Boolean
    Check,
    /// Integer within `min..=max`
    Spin,
    /// One of a fixed list of strings
    Combo,
    /// Action with no value
    Button,
    /// Free text
    String,
    /// Type token this interface does not recognise
    Unknown,
}

impl OptionKind {
    /// Map a `type` token. Unrecognised tokens become `Unknown` so option
    /// discovery never fails on them.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token {
            "check" => OptionKind::Check,
            "spin" => OptionKind::Spin,
            "combo" => OptionKind::Combo,
            "button" => OptionKind::Button,
            "string" => OptionKind::String,
            _ => OptionKind::Unknown,
        }
    }

    #[must_use]
    pub fn as_token(&self) -> &'static str {
        match self {
            OptionKind::Check => "check",
            OptionKind::Spin => "spin",
            OptionKind::Combo => "combo",
            OptionKind::Button => "button",
            OptionKind::String => "string",
            OptionKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

/// A configuration option exposed by an engine. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineOption {
    name: String,
    kind: OptionKind,
    default: Option<String>,
    min: Option<i64>,
    max: Option<i64>,
    vars: Vec<String>,
}

impl EngineOption {
    fn bare(name: impl Into<String>, kind: OptionKind) -> Self {
        EngineOption {
            name: name.into(),
            kind,
            default: None,
            min: None,
            max: None,
            vars: Vec::new(),
        }
    }

    /// Boolean option.
    #[must_use]
    pub fn check(name: impl Into<String>, default: bool) -> Self {
        EngineOption {
            default: Some(default.to_string()),
            ..Self::bare(name, OptionKind::Check)
        }
    }

    /// Integer option. Fails if `min > max`.
    pub fn spin(
        name: impl Into<String>,
        default: i64,
        min: i64,
        max: i64,
    ) -> Result<Self, OptionError> {
        let name = name.into();
        if min > max {
            return Err(OptionError::InvalidRange { name, min, max });
        }
        Ok(EngineOption {
            default: Some(default.to_string()),
            min: Some(min),
            max: Some(max),
            ..Self::bare(name, OptionKind::Spin)
        })
    }

    /// Choice among `vars`, kept in advertisement order.
    #[must_use]
    pub fn combo<V: Into<String>>(
        name: impl Into<String>,
        default: impl Into<String>,
        vars: impl IntoIterator<Item = V>,
    ) -> Self {
        EngineOption {
            default: Some(default.into()),
            vars: vars.into_iter().map(Into::into).collect(),
            ..Self::bare(name, OptionKind::Combo)
        }
    }

    /// Action without a value.
    #[must_use]
    pub fn button(name: impl Into<String>) -> Self {
        Self::bare(name, OptionKind::Button)
    }

    /// Text option. The protocol spells an empty default as `<empty>`.
    #[must_use]
    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        EngineOption {
            default: Some(default.into()),
            ..Self::bare(name, OptionKind::String)
        }
    }

    /// Option whose type token was not recognised.
    #[must_use]
    pub fn unknown(name: impl Into<String>) -> Self {
        Self::bare(name, OptionKind::Unknown)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> OptionKind {
        self.kind
    }

    /// Default as advertised, in protocol text form.
    #[must_use]
    pub fn default_value(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Lower bound of a spin option.
    #[must_use]
    pub fn min(&self) -> Option<i64> {
        self.min
    }

    /// Upper bound of a spin option.
    #[must_use]
    pub fn max(&self) -> Option<i64> {
        self.max
    }

    /// Allowed values of a combo option.
    #[must_use]
    pub fn vars(&self) -> &[String] {
        &self.vars
    }

    /// Build the `setoption` command that assigns `value` (or triggers a
    /// button when `None`).
    #[must_use]
    pub fn setoption_command(&self, value: Option<&str>) -> String {
        match value {
            Some(value) => format!("setoption name {} value {}", self.name, value),
            None => format!("setoption name {}", self.name),
        }
    }
}
