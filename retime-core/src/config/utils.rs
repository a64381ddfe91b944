//! Configuration utility functions
//!
//! This module provides helper functions for reading configuration
//! values from environment variables.

use std::path::PathBuf;

/// Get a string value from an environment variable or use the default
pub fn get_env_string(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

/// Get a path value from an environment variable or use the default
pub fn get_env_path(key: &str, default: PathBuf) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or(default)
}

/// Get an optional path from an environment variable; empty values count as unset
pub fn get_env_optional_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|val| !val.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_variables_fall_back_to_defaults() {
        let key = "RETIME_TEST_SURELY_UNSET_VARIABLE";
        assert_eq!(get_env_string(key, "fallback".to_string()), "fallback");
        assert_eq!(
            get_env_path(key, PathBuf::from("/usr/bin/ffmpeg")),
            PathBuf::from("/usr/bin/ffmpeg")
        );
        assert_eq!(get_env_optional_path(key), None);
    }
}
