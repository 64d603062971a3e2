//! Shared names and constants.

/// Internal directory inside the main binary root.
pub const INTERNAL_DIRNAME: &str = "_cmkx";

/// Package clone root inside the main binary root.
pub const DEPS_SOURCE_DIRNAME: &str = "_deps";

/// Package binary dirs inside the main binary root.
pub const DEPS_BUILD_DIRNAME: &str = "_deps-build";

/// Shared install prefix for all dependency packages.
pub const DEPS_INSTALL_DIRNAME: &str = "_deps-install";

pub const EXECUTOR_DIRNAME: &str = "executor";
pub const TMP_DIRNAME: &str = "tmp";
pub const LOG_DIRNAME: &str = "log";
pub const LOG_EXTENSION: &str = ".log";

/// Log name component for a build of the default target.
pub const ALL_TARGETS_NAME: &str = "all";

/// Config name component when the generator uses no configuration.
pub const NO_CONFIG_NAME: &str = "NoConfig";

/// Binary dir name of the helper project, inside the executor dir.
pub const EXECUTOR_BINARY_DIRNAME: &str = "b";

pub const SETTINGS_FILENAME: &str = "settings.json";
pub const CACHE_TRACKER_FILENAME: &str = "cmkx_cache_tracker.json";

/// Written by the build tool after a successful configure.
pub const CMAKE_CACHE_FILENAME: &str = "CMakeCache.txt";

pub const ADD_PKG_OUT_FILENAME: &str = "add_pkg_out.txt";

/// Cache variable carrying the helper project's command.
pub const EXECUTOR_COMMAND_VAR: &str = "__CMKX_EXECUTOR_COMMAND";

/// Variable the helper script appends package declarations to.
pub const ADD_PKG_OUT_VAR: &str = "__CMKX_ADD_PKG_OUT";

pub const EXECUTOR_LOG_NAME: &str = "deps_script_wrapper";

pub const CMAKE_INSTALL_PREFIX: &str = "CMAKE_INSTALL_PREFIX";
pub const CMAKE_BUILD_TYPE: &str = "CMAKE_BUILD_TYPE";
pub const CMAKE_TOOLCHAIN_FILE: &str = "CMAKE_TOOLCHAIN_FILE";
pub const CMAKE_GENERATOR: &str = "CMAKE_GENERATOR";
pub const CMAKE_GENERATOR_TOOLSET: &str = "CMAKE_GENERATOR_TOOLSET";
pub const CMAKE_GENERATOR_PLATFORM: &str = "CMAKE_GENERATOR_PLATFORM";

/// Variables that global and per-package arguments must not set.
pub const RESERVED_VARIABLES: &[&str] = &[CMAKE_INSTALL_PREFIX];

/// Environment variable overriding the build-tool executable.
pub const CMAKE_ENV_VAR: &str = "CMKX_CMAKE";
