// Test modules for error-recovery crate
//
// Test organization follows the template pattern where each source file
// has a corresponding test file that focuses on business logic verification.

// Shared fixtures (mock platforms, captured errors, wired executors)
pub mod helpers;

// Core unit tests
pub mod classifier;
pub mod notifications;
pub mod store;
