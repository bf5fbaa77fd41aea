// All audit functionality is in normcontrol-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod config_locator;

// Re-export core types for convenience
pub use normcontrol_core::*;
