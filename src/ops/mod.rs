// src/ops/mod.rs

// The standard operator library.
pub mod natives;
pub mod prims;


pub use natives::register_builtins;
