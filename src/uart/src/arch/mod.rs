//! Architecture-specific implementations.
//!
//! This module provides peripheral backends for different target architectures.
//! Currently supported: x86_64.

#[cfg(target_arch = "x86_64")]
pub mod x86_64;
