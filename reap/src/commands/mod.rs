/// Connectivity check
pub mod check;

/// Plan execution with preview and confirmation
pub mod clean;

/// Config command handlers
pub mod config;

/// Read-only retention plan
pub mod plan;

/// Flags and session setup shared by registry commands
pub mod session;

/// Version command handlers
pub mod version;
