//! Test support utilities for the fixture workspace.
//!
//! This crate provides the testing side of the fixture builders:
//! - Data set comparison with configurable strictness
//! - Isolated SQLite databases that are removed on drop
//! - Shared fixture tables, typed builders and sample data
//! - A recording transport for checking transaction boundaries
//! - Property-based test generators and assertion helpers
//!
//! # Example Usage
//!
//! ```no_run
//! use common::row;
//! use testsupport::prelude::*;
//!
//! #[test]
//! fn inserted_rows_are_found() {
//!     let ctx = TestContext::shop().unwrap();
//!     let mut users = Users::new(ctx.db()).unwrap();
//!     users
//!         .new_insert_with_row().unwrap()
//!         .id(1).unwrap()
//!         .name("alice").unwrap()
//!         .execute().unwrap();
//!
//!     let expected = users
//!         .new_data_set_with_row().unwrap()
//!         .name("alice").unwrap()
//!         .build_data_set().unwrap();
//!     assert_contains_expected_data(&expected, &users.get_all().unwrap());
//! }
//! ```

pub mod assertions;
pub mod compare;
pub mod context;
pub mod fixtures;
mod macros;
pub mod proptest_generators;
pub mod transport;

/// Convenient re-exports for common testing patterns.
pub mod prelude {
    pub use crate::assertions::*;
    pub use crate::compare::*;
    pub use crate::context::*;
    pub use crate::fixtures::*;
    pub use crate::transport::{RecordingProvider, TransportEvent};
}
