//! Atomic mutation chains for the Redis store, executed as Lua scripts.

pub mod executor;
pub mod scripts;

pub use executor::{ScriptCall, run_script};
