// # State Store Implementations
//
// This module provides implementations of the StateStore trait for
// different persistence strategies.

pub mod file;
pub mod memory;

pub use file::{FileStateStore, sanitize_key};
pub use memory::MemoryStateStore;
