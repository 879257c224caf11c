//! API implementation submodules.
//!
//! Each submodule contains `impl AssetEngine` blocks or helpers for it. The
//! struct definition remains in `lib.rs`.

mod builder;
mod runs;

pub use builder::AssetEngineBuilder;
