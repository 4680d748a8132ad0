//! `tsrs`: lexer, parser, and structural type checker for a statically-typed,
//! class-based scripting language in the TypeScript/JavaScript family
//! (spec §1-§2), plus the CLI/config/diagnostics shell that drives it.
//!
//! The `tsrs` binary (`src/main.rs`) is a thin wrapper over this library so
//! that `tests/` can exercise the compiler pipeline end-to-end without
//! shelling out to the built binary.

pub mod cli;
pub mod compile;
pub mod compiler;
pub mod config;
