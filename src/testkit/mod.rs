//! Test support shared by unit tests, integration tests and `phpinspect verify`.
//!
//! - [`fixture`]: inline-marker fixtures (`<warning descr="...">...</warning>`),
//!   their verification against the pipeline, and the inverse rendering used
//!   by the `annotated` output format.
//! - [`assertions`]: the `assert_fixture_verifies!` macro, exported at the crate root.

pub mod assertions;
pub mod fixture;

pub use fixture::{annotate, verify_fixture, ExpectedDiagnostic, Fixture, FixtureOutcome};
