//! Basalt Tests - Simulated cluster and integration tests.
//!
//! ## Test Organization
//!
//! **Integration Tests** (`*_tests.rs`): Multi-component integration
//! - `resolver_tests`: Region location, meta bootstrap, publication races
//! - `dispatcher_tests`: Dispatch, deadlines, error pass-through
//! - `scan_tests`: Multi-region scan pagination
//! - `client_tests`: Per-verb helpers end to end
//!
//! **Support Modules**:
//! - `simulated_cluster`: In-memory meta and region servers behind the
//!   `RegionConnection`, `ConnectionFactory` and `MetaLocator` traits
//!
//! ## Naming Conventions
//!
//! - Integration tests: `test_<component>_<scenario>`
//! - Unit tests: Inline in each crate under `#[cfg(test)]`

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod simulated_cluster;

// Integration test modules (multi-component tests).
#[cfg(test)]
mod client_tests;
#[cfg(test)]
mod dispatcher_tests;
#[cfg(test)]
mod scan_tests;

/// Installs a test-writer subscriber once; later calls are no-ops.
///
/// Honors `RUST_LOG`, defaulting to `info`.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
