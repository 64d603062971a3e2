//! Configure-step argument handling.
//!
//! Arguments arrive as raw command-line tokens, possibly split (`-D FOO=1`),
//! possibly repeated, possibly setting generator selection through variables.
//! [`normalize`] turns them into a canonical, de-duplicated, sorted sequence so
//! that equivalent argument sets compare equal. The cache tracker depends on
//! that property.

pub mod types;

use std::collections::HashMap;

use crate::consts::{CMAKE_GENERATOR, CMAKE_GENERATOR_PLATFORM, CMAKE_GENERATOR_TOOLSET, RESERVED_VARIABLES};

pub use types::{ArgError, ArgKey, BuildArgument, SwitchKind};

/// Normalize raw argument tokens.
///
/// - merges split switches: `-D FOO=1` becomes `-DFOO=1`
/// - promotes `CMAKE_GENERATOR`, `CMAKE_GENERATOR_TOOLSET` and
///   `CMAKE_GENERATOR_PLATFORM` definitions to `-G`, `-T` and `-A`
/// - resolves repeated arguments (last one wins, `-U` and `-D` of the same
///   variable override each other)
/// - sorts canonically
pub fn normalize<S: AsRef<str>>(args: &[S]) -> Result<Vec<BuildArgument>, ArgError> {
  let mut parsed = Vec::with_capacity(args.len());
  let mut tokens = args.iter().map(AsRef::as_ref);

  while let Some(token) = tokens.next() {
    let arg = if SwitchKind::is_bare_switch(token) {
      let Some(value) = tokens.next() else {
        return Err(ArgError::MalformedArgument {
          arg: token.to_string(),
          reason: "switch is missing its argument",
        });
      };
      BuildArgument::parse(&format!("{token}{value}"))?
    } else {
      BuildArgument::parse(token)?
    };
    parsed.push(promote(arg));
  }

  Ok(canonicalize(parsed))
}

/// Like [`normalize`], but rejects arguments touching reserved variables.
///
/// Used for global arguments, which apply to every package. The install prefix
/// of each package is set internally.
pub fn normalize_global<S: AsRef<str>>(args: &[S]) -> Result<Vec<BuildArgument>, ArgError> {
  let normalized = normalize(args)?;
  if let Some(arg) = find_reserved(&normalized) {
    return Err(ArgError::ConflictingArgument {
      name: arg.name.clone(),
      arg: arg.render(),
    });
  }
  Ok(normalized)
}

/// Resolve duplicates (last wins) and sort an already parsed sequence.
pub fn canonicalize(args: impl IntoIterator<Item = BuildArgument>) -> Vec<BuildArgument> {
  let mut by_key: HashMap<ArgKey, BuildArgument> = HashMap::new();
  for arg in args {
    by_key.insert(arg.key(), arg);
  }

  let mut result: Vec<BuildArgument> = by_key.into_values().collect();
  result.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
  result
}

/// The first argument that defines or undefines a reserved variable.
pub fn find_reserved(args: &[BuildArgument]) -> Option<&BuildArgument> {
  args
    .iter()
    .find(|arg| arg.kind.is_variable() && RESERVED_VARIABLES.contains(&arg.name.as_str()))
}

/// The argument that defines or undefines `name`, if any.
pub fn find_variable<'a>(args: &'a [BuildArgument], name: &str) -> Option<&'a BuildArgument> {
  args.iter().rev().find(|arg| arg.is_variable(name))
}

/// The definition (`-D`) of `name`, if it is defined.
pub fn find_define<'a>(args: &'a [BuildArgument], name: &str) -> Option<&'a BuildArgument> {
  find_variable(args, name).filter(|arg| arg.kind == SwitchKind::Define)
}

/// The argument of the given switch kind, if any.
pub fn find_switch(args: &[BuildArgument], kind: SwitchKind) -> Option<&BuildArgument> {
  args.iter().rev().find(|arg| arg.kind == kind)
}

/// The generator selected by a normalized argument set (empty = platform default).
pub fn generator(args: &[BuildArgument]) -> &str {
  find_switch(args, SwitchKind::Generator)
    .map(|arg| arg.value.as_str())
    .unwrap_or("")
}

/// Whether the generator embeds all configurations in one build tree.
///
/// An empty name means the platform default generator.
pub fn is_generator_multiconfig(generator: &str) -> bool {
  if generator.is_empty() {
    return cfg!(windows);
  }
  generator.starts_with("Visual Studio") || generator == "Xcode" || generator.contains("Multi-Config")
}

fn promote(arg: BuildArgument) -> BuildArgument {
  if arg.kind != SwitchKind::Define {
    return arg;
  }
  let kind = match arg.name.as_str() {
    CMAKE_GENERATOR => SwitchKind::Generator,
    CMAKE_GENERATOR_TOOLSET => SwitchKind::Toolset,
    CMAKE_GENERATOR_PLATFORM => SwitchKind::Arch,
    _ => return arg,
  };
  BuildArgument::switch(kind, arg.value)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn rendered(args: &[BuildArgument]) -> Vec<String> {
    args.iter().map(BuildArgument::render).collect()
  }

  #[test]
  fn merges_split_switches() {
    let args = normalize(&["-D", "FOO=1", "-G", "Ninja", "-U", "BAR"]).unwrap();
    assert_eq!(rendered(&args), vec!["-DFOO=1", "-GNinja", "-UBAR"]);
  }

  #[test]
  fn split_switch_without_value_is_malformed() {
    assert!(matches!(
      normalize(&["-DFOO=1", "-D"]),
      Err(ArgError::MalformedArgument { .. })
    ));
  }

  #[test]
  fn last_definition_wins() {
    let args = normalize(&["-DFOO=1", "-DFOO:STRING=2"]).unwrap();
    assert_eq!(rendered(&args), vec!["-DFOO:STRING=2"]);
  }

  #[test]
  fn later_undefine_cancels_define() {
    let args = normalize(&["-DFOO=1", "-UFOO"]).unwrap();
    assert_eq!(rendered(&args), vec!["-UFOO"]);
  }

  #[test]
  fn later_define_cancels_undefine() {
    let args = normalize(&["-DFOO=1", "-UFOO", "-DFOO=3"]).unwrap();
    assert_eq!(rendered(&args), vec!["-DFOO=3"]);
  }

  #[test]
  fn promotes_generator_variables() {
    let args = normalize(&[
      "-DCMAKE_GENERATOR=Ninja",
      "-DCMAKE_GENERATOR_TOOLSET:STRING=v142",
      "-DCMAKE_GENERATOR_PLATFORM=x64",
    ])
    .unwrap();
    assert_eq!(rendered(&args), vec!["-Ax64", "-GNinja", "-Tv142"]);
  }

  #[test]
  fn promoted_generator_overrides_switch() {
    let args = normalize(&["-GNinja", "-DCMAKE_GENERATOR=Xcode"]).unwrap();
    assert_eq!(generator(&args), "Xcode");
  }

  #[test]
  fn output_is_canonical() {
    let a = normalize(&["-DB=2", "-GNinja", "-DA=1", "-UC"]).unwrap();
    let b = normalize(&["-UC", "-DA=1", "-D", "B=2", "-GNinja"]).unwrap();
    assert_eq!(a, b);
    assert_eq!(rendered(&a), vec!["-DA=1", "-DB=2", "-GNinja", "-UC"]);
  }

  #[test]
  fn normalize_is_idempotent() {
    let once = normalize(&["-DB=2", "-D", "A=1", "-Cinit.cmake"]).unwrap();
    let twice = normalize(&rendered(&once)).unwrap();
    assert_eq!(once, twice);
  }

  #[test]
  fn normalize_global_rejects_install_prefix() {
    let err = normalize_global(&["-DCMAKE_INSTALL_PREFIX=/opt"]).unwrap_err();
    assert_eq!(
      err,
      ArgError::ConflictingArgument {
        name: "CMAKE_INSTALL_PREFIX".to_string(),
        arg: "-DCMAKE_INSTALL_PREFIX=/opt".to_string(),
      }
    );
    assert!(normalize_global(&["-UCMAKE_INSTALL_PREFIX"]).is_err());
    assert!(normalize_global(&["-DFOO=1"]).is_ok());
  }

  #[test]
  fn find_variable_matches_define_and_undefine() {
    let args = normalize(&["-DFOO=1", "-UBAR"]).unwrap();
    assert_eq!(find_variable(&args, "FOO").unwrap().value, "1");
    assert_eq!(find_variable(&args, "BAR").unwrap().kind, SwitchKind::Undefine);
    assert!(find_variable(&args, "BAZ").is_none());

    assert_eq!(find_define(&args, "FOO").unwrap().value, "1");
    assert!(find_define(&args, "BAR").is_none());
  }

  #[test]
  fn multiconfig_detection() {
    assert!(is_generator_multiconfig("Visual Studio 17 2022"));
    assert!(is_generator_multiconfig("Xcode"));
    assert!(is_generator_multiconfig("Ninja Multi-Config"));
    assert!(!is_generator_multiconfig("Ninja"));
    assert!(!is_generator_multiconfig("Unix Makefiles"));
    assert_eq!(is_generator_multiconfig(""), cfg!(windows));
  }
}
