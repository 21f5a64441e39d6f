//! Benchsweep workspace-level test utilities.
//!
//! This crate exists solely to support workspace-level integration tests,
//! particularly the BDD/cucumber tests in `tests/cucumber.rs`.
//!
//! The actual benchsweep functionality is in the workspace member crates:
//! - `benchsweep-types`: Ledger and target contracts
//! - `benchsweep-domain`: Target selection and sample statistics
//! - `benchsweep-adapters`: Process, build-tool and ledger I/O
//! - `benchsweep-app`: Application use cases
//! - `benchsweep-cli`: The `benchsweep` binary
