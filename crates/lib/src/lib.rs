//! cmkx-lib: build coordination on top of CMake
//!
//! This crate decides, per (package, configuration), whether a configure step
//! is needed, runs configure and build steps, and reads the package
//! dependencies declared by dependency manifests:
//! - `args`: normalized configure arguments
//! - `cache`: propose/confirm tracking of applied arguments per binary dir
//! - `layout`: directory layout of a build tree
//! - `build`: configure and build of one package or the main project
//! - `deps`: evaluation of dependency manifests into package requests
//! - `process`: subprocess execution with output capture and log files

pub mod args;
pub mod build;
pub mod cache;
pub mod consts;
pub mod deps;
pub mod layout;
pub mod process;
pub mod settings;
pub mod util;
