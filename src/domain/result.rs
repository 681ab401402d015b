//! Result type alias for Sieve

use super::errors::SieveError;

/// Result type alias for Sieve operations
///
/// # Examples
///
/// ```
/// use sieve::domain::result::Result;
/// use sieve::domain::errors::SieveError;
///
/// fn failing_function() -> Result<()> {
///     Err(SieveError::Validation("Invalid input".to_string()))
/// }
/// # assert!(failing_function().is_err());
/// ```
pub type Result<T> = std::result::Result<T, SieveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
