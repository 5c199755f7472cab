//! Testing infrastructure for suitelens unit and integration tests.
//!
//! Fixtures are deterministic: every builder anchors to [`base_time`] so
//! assertions never depend on the wall clock.

pub mod fixtures;

pub use fixtures::{ResultBuilder, SessionBuilder, base_time};
