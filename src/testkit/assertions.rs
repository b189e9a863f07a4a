//! Assertion macros for fixture verification.
//!
//! - [`crate::assert_fixture_verifies!`] - Assert a fixture has no missing or unexpected diagnostics
//!
//! # Example
//!
//! ```rust,ignore
//! use phpinspect::assert_fixture_verifies;
//! use phpinspect::testkit::verify_fixture;
//!
//! let outcome = verify_fixture(&text, path, &config)?;
//! assert_fixture_verifies!(outcome);
//! ```

/// Assert that a [`FixtureOutcome`](crate::testkit::FixtureOutcome) matched
/// every marker and produced nothing else.
#[macro_export]
macro_rules! assert_fixture_verifies {
    ($outcome:expr) => {{
        let outcome = $outcome;
        assert!(
            outcome.is_success(),
            "Fixture mismatch\n  missing: {:#?}\n  unexpected: {:#?}\n  at {}:{}:{}",
            outcome.missing,
            outcome.unexpected,
            file!(),
            line!(),
            column!()
        );
    }};
}
