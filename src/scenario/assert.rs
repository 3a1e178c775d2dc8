//! Checks that turn a mismatch into [`CheckError::AssertionMismatch`].

use crate::errors::{CheckError, Result};
use std::fmt::Display;

pub fn expect_eq<T>(context: &str, expected: &T, actual: &T) -> Result<()>
where
    T: PartialEq + Display + ?Sized,
{
    if expected == actual {
        Ok(())
    } else {
        Err(mismatch(context, expected, actual))
    }
}

/// Passes when `actual` contains `needle` as a substring.
pub fn expect_contains(context: &str, needle: &str, actual: &str) -> Result<()> {
    if actual.contains(needle) {
        Ok(())
    } else {
        Err(mismatch(context, &format!("text containing {}", needle), actual))
    }
}

pub fn expect_true(context: &str, actual: bool) -> Result<()> {
    expect_eq(context, &true, &actual)
}

fn mismatch<A, B>(context: &str, expected: &A, actual: &B) -> CheckError
where
    A: Display + ?Sized,
    B: Display + ?Sized,
{
    CheckError::AssertionMismatch {
        context: context.to_string(),
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
}
