use std::env;

use tracing::debug;

/// Loads a `.env` file from the working directory, if there is one.
///
/// Variables already present in the process environment take precedence.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

/// Retrieves a secret from the environment, treating empty or whitespace-only values as unset.
///
/// # Arguments
/// - `var`: The name of the environment variable.
///
/// # Returns
/// - `Option<String>` with surrounding whitespace removed.
pub fn get_env_secret(var: &str) -> Option<String> {
    env::var(var)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Retrieves an environment variable, or the given default when it is unset or empty.
pub fn get_env_var_or(var: &str, default: &str) -> String {
    get_env_secret(var).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_blank_values_are_unset() {
        env::set_var("NEWSFORGE_TEST_BLANK", "   ");
        assert_eq!(get_env_secret("NEWSFORGE_TEST_BLANK"), None);
        assert_eq!(get_env_secret("NEWSFORGE_TEST_NEVER_SET"), None);
        assert_eq!(
            get_env_var_or("NEWSFORGE_TEST_NEVER_SET", "fallback"),
            "fallback"
        );

        env::set_var("NEWSFORGE_TEST_VALUE", " value ");
        assert_eq!(
            get_env_secret("NEWSFORGE_TEST_VALUE").as_deref(),
            Some("value")
        );
    }
}
