//! # Environment Variables
//!
//! Utilities for reading and parsing environment variables.

use std::env;
use std::str::FromStr;

/// Get an environment variable by name.
pub fn get_env(name: &'static str) -> Result<String, Error> {
    env::var(name).map_err(|_| Error::MissingEnv(name))
}

/// Get an environment variable, falling back to `default` when unset.
pub fn get_env_or(name: &'static str, default: &str) -> String {
    get_env(name).unwrap_or_else(|_| default.to_string())
}

/// Get and parse an optional environment variable.
///
/// Unset (or blank) yields `Ok(None)`; a present but unparsable value is still an error.
pub fn get_env_parse_opt<T: FromStr>(name: &'static str) -> Result<Option<T>, Error> {
    match get_env(name) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::WrongFormat(name)),
        Err(Error::MissingEnv(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

// region:    --- Error
#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    MissingEnv(&'static str),
    WrongFormat(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(fmt, "{self:?}")
    }
}

impl std::error::Error for Error {}
// endregion: --- Error

#[cfg(test)]
mod tests {
    use super::*;

    // Each test owns a distinct variable name; the process environment is shared.

    #[test]
    fn test_get_env_or_falls_back() {
        env::remove_var("LIB_UTILS_TEST_UNSET");
        assert_eq!(get_env_or("LIB_UTILS_TEST_UNSET", "fallback"), "fallback");
    }

    #[test]
    fn test_get_env_parse_opt() {
        env::remove_var("LIB_UTILS_TEST_LIMIT");
        assert_eq!(get_env_parse_opt::<usize>("LIB_UTILS_TEST_LIMIT"), Ok(None));

        env::set_var("LIB_UTILS_TEST_LIMIT", " 42 ");
        assert_eq!(get_env_parse_opt::<usize>("LIB_UTILS_TEST_LIMIT"), Ok(Some(42)));

        env::set_var("LIB_UTILS_TEST_LIMIT", "many");
        assert_eq!(
            get_env_parse_opt::<usize>("LIB_UTILS_TEST_LIMIT"),
            Err(Error::WrongFormat("LIB_UTILS_TEST_LIMIT"))
        );
        env::remove_var("LIB_UTILS_TEST_LIMIT");
    }
}
