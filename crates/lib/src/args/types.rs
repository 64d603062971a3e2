//! Build-tool argument types.
//!
//! A [`BuildArgument`] is one configure-step switch in merged single-token form:
//!
//! ```text
//! -DNAME[:TYPE]=VALUE    define a cache variable
//! -UNAME                 remove a cache variable
//! -C<path>               pre-load a cache script
//! -G<generator>          select the generator
//! -T<toolset>            select the generator toolset
//! -A<platform>           select the generator platform
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of a configure switch.
///
/// Declaration order is the canonical sort order (the alphabetical order of the
/// switch letters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SwitchKind {
  /// `-A<platform>`
  Arch,
  /// `-C<path>`
  CacheScript,
  /// `-DNAME[:TYPE]=VALUE`
  Define,
  /// `-G<generator>`
  Generator,
  /// `-T<toolset>`
  Toolset,
  /// `-UNAME`
  Undefine,
}

impl SwitchKind {
  pub fn switch(self) -> &'static str {
    match self {
      SwitchKind::Arch => "-A",
      SwitchKind::CacheScript => "-C",
      SwitchKind::Define => "-D",
      SwitchKind::Generator => "-G",
      SwitchKind::Toolset => "-T",
      SwitchKind::Undefine => "-U",
    }
  }

  fn from_switch(switch: &str) -> Option<Self> {
    match switch {
      "-A" => Some(SwitchKind::Arch),
      "-C" => Some(SwitchKind::CacheScript),
      "-D" => Some(SwitchKind::Define),
      "-G" => Some(SwitchKind::Generator),
      "-T" => Some(SwitchKind::Toolset),
      "-U" => Some(SwitchKind::Undefine),
      _ => None,
    }
  }

  /// Whether this switch names a cache variable (`-D`, `-U`).
  pub fn is_variable(self) -> bool {
    matches!(self, SwitchKind::Define | SwitchKind::Undefine)
  }

  /// Whether `token` is a bare switch expecting its value in the next token.
  pub(crate) fn is_bare_switch(token: &str) -> bool {
    Self::from_switch(token).is_some()
  }
}

/// Errors produced while parsing or normalizing arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgError {
  /// The token is not a supported switch or lacks a required part.
  #[error("malformed argument '{arg}': {reason}")]
  MalformedArgument { arg: String, reason: &'static str },

  /// The argument sets a variable that is reserved for internal use.
  #[error("argument '{arg}' sets the reserved variable {name}")]
  ConflictingArgument { name: String, arg: String },
}

/// One normalized configure switch.
///
/// For `-D`/`-U`, `name` is the variable name and is never empty. For the other
/// switches `name` and `type_` are empty and `value` holds the switch argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildArgument {
  pub kind: SwitchKind,
  pub name: String,
  pub type_: String,
  pub value: String,
}

/// Identity of an argument within a normalized set.
///
/// `-D` and `-U` of the same variable share a key so they override each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArgKey {
  Variable(String),
  Switch(SwitchKind),
}

impl BuildArgument {
  pub fn define(name: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      kind: SwitchKind::Define,
      name: name.into(),
      type_: String::new(),
      value: value.into(),
    }
  }

  pub fn define_typed(name: impl Into<String>, type_: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      type_: type_.into(),
      ..Self::define(name, value)
    }
  }

  pub fn undefine(name: impl Into<String>) -> Self {
    Self {
      kind: SwitchKind::Undefine,
      name: name.into(),
      type_: String::new(),
      value: String::new(),
    }
  }

  /// A value-carrying switch (`-C`, `-G`, `-T`, `-A`).
  pub fn switch(kind: SwitchKind, value: impl Into<String>) -> Self {
    debug_assert!(!kind.is_variable());
    Self {
      kind,
      name: String::new(),
      type_: String::new(),
      value: value.into(),
    }
  }

  /// Parse a merged single-token argument such as `-DFOO:STRING=bar`.
  pub fn parse(arg: &str) -> Result<Self, ArgError> {
    let malformed = |reason| ArgError::MalformedArgument {
      arg: arg.to_string(),
      reason,
    };

    let (switch, rest) = match arg.get(..2) {
      Some(switch) => (switch, &arg[2..]),
      None => return Err(malformed("expected a -D, -U, -C, -G, -T or -A switch")),
    };
    let kind = SwitchKind::from_switch(switch).ok_or_else(|| malformed("unsupported switch"))?;

    match kind {
      SwitchKind::Define => {
        let Some(sep) = rest.find([':', '=']) else {
          return Err(malformed("missing '=' after the variable name"));
        };
        let name = &rest[..sep];
        if name.is_empty() {
          return Err(malformed("missing variable name"));
        }
        let (type_, value) = if rest[sep..].starts_with(':') {
          let typed = &rest[sep + 1..];
          let Some(eq) = typed.find('=') else {
            return Err(malformed("missing '=' after the variable type"));
          };
          (&typed[..eq], &typed[eq + 1..])
        } else {
          ("", &rest[sep + 1..])
        };
        Ok(Self::define_typed(name, type_, value))
      }
      SwitchKind::Undefine => {
        if rest.is_empty() {
          return Err(malformed("missing variable name"));
        }
        Ok(Self::undefine(rest))
      }
      _ => {
        if rest.is_empty() {
          return Err(malformed("missing switch argument"));
        }
        Ok(Self::switch(kind, rest))
      }
    }
  }

  /// Canonical single-token text form.
  pub fn render(&self) -> String {
    match self.kind {
      SwitchKind::Define if self.type_.is_empty() => format!("-D{}={}", self.name, self.value),
      SwitchKind::Define => format!("-D{}:{}={}", self.name, self.type_, self.value),
      SwitchKind::Undefine => format!("-U{}", self.name),
      kind => format!("{}{}", kind.switch(), self.value),
    }
  }

  pub fn key(&self) -> ArgKey {
    if self.kind.is_variable() {
      ArgKey::Variable(self.name.clone())
    } else {
      ArgKey::Switch(self.kind)
    }
  }

  /// Canonical ordering key: switch kind first, then variable name.
  pub fn sort_key(&self) -> (SwitchKind, &str) {
    (self.kind, self.name.as_str())
  }

  /// Whether this argument defines or undefines the variable `name`.
  pub fn is_variable(&self, name: &str) -> bool {
    self.kind.is_variable() && self.name == name
  }
}

impl fmt::Display for BuildArgument {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.render())
  }
}

impl FromStr for BuildArgument {
  type Err = ArgError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl TryFrom<String> for BuildArgument {
  type Error = ArgError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value)
  }
}

impl From<BuildArgument> for String {
  fn from(arg: BuildArgument) -> Self {
    arg.render()
  }
}
