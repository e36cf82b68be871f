//! Boardsmith core library.
//!
//! Boardsmith composes the build configuration of a firmware board target:
//! named build units, the links between them, and a board configuration
//! layered from ordered configuration fragments. The assembled
//! [`composer::Composition`] is handed unchanged to a downstream build
//! evaluator as JSON, a CMake snippet, or a merged fragment file.

pub mod ast;
pub mod boardfile;
pub mod cli;
pub mod cmake_gen;
pub mod composer;
pub mod fragment;
pub mod hasher;
pub mod runner;
