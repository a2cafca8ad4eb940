//! Secure token manager with memory-safe handling and masking capabilities
//!
//! This module provides token handling for platform authentication, using the
//! `secrecy` crate to prevent accidental token exposure in logs or memory dumps.

use crate::core::types::Platform;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;

/// Supported platforms with their environment variable names
const PLATFORM_TOKENS: &[(Platform, &str)] = &[
    (Platform::Curseforge, "CURSEFORGE_TOKEN"),
    (Platform::Modrinth, "MODRINTH_TOKEN"),
];

/// Secure token manager for platform authentication
///
/// # Examples
///
/// ```
/// use mod_publisher::core::types::Platform;
/// use mod_publisher::security::SecureTokenManager;
/// use secrecy::ExposeSecret;
///
/// let manager = SecureTokenManager::new();
/// if let Some(token) = manager.get_token(Platform::Modrinth) {
///     println!("Modrinth token found: {}", manager.mask_token(token.expose_secret()));
/// }
/// ```
#[derive(Default)]
pub struct SecureTokenManager {
    token_vars: HashMap<Platform, &'static str>,
}

impl SecureTokenManager {
    /// Creates a new SecureTokenManager with default platform mappings
    pub fn new() -> Self {
        let token_vars = PLATFORM_TOKENS.iter().copied().collect();
        Self { token_vars }
    }

    /// Wraps a configured token, trimmed; blank tokens count as absent
    ///
    /// # Examples
    ///
    /// ```
    /// use mod_publisher::security::SecureTokenManager;
    /// use secrecy::ExposeSecret;
    ///
    /// let token = SecureTokenManager::secret_from(Some("  abc  ")).unwrap();
    /// assert_eq!(token.expose_secret(), "abc");
    /// assert!(SecureTokenManager::secret_from(Some("   ")).is_none());
    /// ```
    pub fn secret_from(value: Option<&str>) -> Option<SecretString> {
        let trimmed = value?.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(SecretString::new(trimmed.into()))
    }

    /// Retrieves a token for `platform` from the process environment
    pub fn get_token(&self, platform: Platform) -> Option<SecretString> {
        let token_name = self.token_vars.get(&platform)?;
        let token_value = env::var(token_name).ok()?;
        Self::secret_from(Some(&token_value))
    }

    /// Retrieves a token for `platform` from an explicit environment map
    pub fn token_from_env(
        &self,
        platform: Platform,
        env: &HashMap<String, String>,
    ) -> Option<SecretString> {
        let token_name = self.token_vars.get(&platform)?;
        Self::secret_from(env.get(*token_name).map(String::as_str))
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    ///
    /// # Examples
    ///
    /// ```
    /// use mod_publisher::security::SecureTokenManager;
    ///
    /// let manager = SecureTokenManager::new();
    /// assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
    /// assert_eq!(manager.mask_token("short"), "****");
    /// ```
    pub fn mask_token(&self, token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 10 {
            return "****".to_string();
        }

        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Masks every token known from the process environment in `text`
    pub fn mask_tokens_in_string(&self, text: &str) -> String {
        let tokens: Vec<SecretString> = PLATFORM_TOKENS
            .iter()
            .filter_map(|(platform, _)| self.get_token(*platform))
            .collect();

        self.mask_secrets(text, &tokens)
    }

    /// Masks each of `tokens` wherever it occurs in `text`
    pub fn mask_secrets(&self, text: &str, tokens: &[SecretString]) -> String {
        let mut masked = text.to_string();

        for token in tokens {
            let token_str = token.expose_secret();
            if let Ok(regex) = Regex::new(&regex::escape(token_str)) {
                let masked_token = self.mask_token(token_str);
                masked = regex
                    .replace_all(&masked, masked_token.as_str())
                    .to_string();
            }
        }

        masked
    }

    /// Gets the environment variable name for a platform
    ///
    /// # Examples
    ///
    /// ```
    /// use mod_publisher::core::types::Platform;
    /// use mod_publisher::security::SecureTokenManager;
    ///
    /// let manager = SecureTokenManager::new();
    /// assert_eq!(manager.get_token_name(Platform::Modrinth), Some("MODRINTH_TOKEN"));
    /// ```
    pub fn get_token_name(&self, platform: Platform) -> Option<&'static str> {
        self.token_vars.get(&platform).copied()
    }

    /// Returns every platform with a known token variable
    pub fn get_supported_platforms(&self) -> Vec<Platform> {
        PLATFORM_TOKENS.iter().map(|(platform, _)| *platform).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_manager() {
        let manager = SecureTokenManager::new();
        assert_eq!(
            manager.get_supported_platforms(),
            vec![Platform::Curseforge, Platform::Modrinth]
        );
    }

    #[test]
    fn test_get_token_name() {
        let manager = SecureTokenManager::new();
        assert_eq!(
            manager.get_token_name(Platform::Curseforge),
            Some("CURSEFORGE_TOKEN")
        );
        assert_eq!(manager.get_token_name(Platform::Modrinth), Some("MODRINTH_TOKEN"));
    }

    #[test]
    fn test_token_from_env_trims_and_skips_blank() {
        let manager = SecureTokenManager::new();
        let mut env = HashMap::new();
        env.insert("MODRINTH_TOKEN".to_string(), " mrp_token \n".to_string());
        env.insert("CURSEFORGE_TOKEN".to_string(), "   ".to_string());

        let token = manager.token_from_env(Platform::Modrinth, &env);
        assert_eq!(token.unwrap().expose_secret(), "mrp_token");
        assert!(manager.token_from_env(Platform::Curseforge, &env).is_none());
    }

    #[test]
    fn test_get_token_returns_secret_when_env_var_set() {
        unsafe {
            env::set_var("CURSEFORGE_TOKEN", "test-curseforge-token-12345");
        }
        let manager = SecureTokenManager::new();
        let token = manager.get_token(Platform::Curseforge);
        assert_eq!(token.unwrap().expose_secret(), "test-curseforge-token-12345");
        unsafe {
            env::remove_var("CURSEFORGE_TOKEN");
        }
    }

    #[test]
    fn test_secret_from_none() {
        assert!(SecureTokenManager::secret_from(None).is_none());
    }

    #[test]
    fn test_mask_token_with_short_token() {
        let manager = SecureTokenManager::new();
        assert_eq!(manager.mask_token("short"), "****");
        assert_eq!(manager.mask_token(""), "****");
    }

    #[test]
    fn test_mask_token_with_long_token() {
        let manager = SecureTokenManager::new();
        assert_eq!(manager.mask_token("abcdef123456"), "abc...456");
        assert_eq!(manager.mask_token("very-long-token-string"), "ver...ing");
    }

    #[test]
    fn test_mask_token_multibyte() {
        let manager = SecureTokenManager::new();
        assert_eq!(manager.mask_token("ééééééééééé"), "ééé...ééé");
    }

    #[test]
    fn test_mask_secrets() {
        let manager = SecureTokenManager::new();
        let tokens = vec![SecretString::new("secret.token+12345".into())];

        let output = manager.mask_secrets("auth failed for secret.token+12345", &tokens);

        assert_eq!(output, "auth failed for sec...345");
    }

    #[test]
    fn test_mask_secrets_no_tokens() {
        let manager = SecureTokenManager::new();
        let input = "This is a safe string with no tokens";
        assert_eq!(manager.mask_secrets(input, &[]), input);
    }
}
