//! # posio Testkit
//!
//! Test utilities for posio.
//!
//! This crate provides:
//! - Temporary file fixtures and a backend-agnostic test handle
//! - A reference model of the positional contract
//! - Contract suites runnable against any backend
//! - Property-based test generators using proptest
//! - Stress testing utilities
//!
//! ## Usage
//!
//! ```rust,ignore
//! use posio_testkit::prelude::*;
//!
//! #[test]
//! fn read_table_on_every_backend() {
//!     let source = shuffled_source(42);
//!     with_each_backend(&source, |_, handle| {
//!         check_read_table(handle, &source, 42);
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod contract;
pub mod fixtures;
pub mod generators;
pub mod model;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::contract::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::model::*;
    pub use crate::stress::*;
}

pub use contract::*;
pub use fixtures::*;
pub use generators::*;
pub use model::*;
pub use stress::*;
