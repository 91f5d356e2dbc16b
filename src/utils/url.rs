//! URL utilities for consistent URL handling
//!
//! Base URLs are stored with exactly one trailing slash so endpoint paths
//! such as `v1/models` can be appended directly.

/// Base URL used when the user has not configured one.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/";

/// Normalize a base URL so it ends with a single trailing slash.
///
/// Surrounding whitespace is trimmed. An empty input stays empty so that a
/// cleared field survives a save/load round trip; callers that need a usable
/// URL go through [`effective_base_url`]. Applying the function twice yields
/// the same string.
///
/// # Examples
///
/// ```
/// use parley::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:11434"), "http://localhost:11434/");
/// assert_eq!(normalize_base_url("https://api.example.com/"), "https://api.example.com/");
/// assert_eq!(normalize_base_url("https://api.example.com///"), "https://api.example.com/");
/// assert_eq!(normalize_base_url(""), "");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}/", trimmed.trim_end_matches('/'))
}

/// The base URL requests should actually go to: the normalized configured
/// value, or [`DEFAULT_BASE_URL`] when nothing is configured.
pub fn effective_base_url(base_url: &str) -> String {
    let normalized = normalize_base_url(base_url);
    if normalized.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        normalized
    }
}

/// Construct a complete API endpoint URL from a base URL and endpoint path
///
/// # Examples
///
/// ```
/// use parley::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:11434", "v1/chat/completions"),
///     "http://localhost:11434/v1/chat/completions"
/// );
/// assert_eq!(
///     construct_api_url("https://api.example.com/proxy/", "/v1/models"),
///     "https://api.example.com/proxy/v1/models"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let base = effective_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{base}{endpoint}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        // Missing trailing slash is appended
        assert_eq!(
            normalize_base_url("https://api.example.com"),
            "https://api.example.com/"
        );

        // Single trailing slash is kept
        assert_eq!(
            normalize_base_url("https://api.example.com/"),
            "https://api.example.com/"
        );

        // Multiple trailing slashes collapse to one
        assert_eq!(
            normalize_base_url("https://api.example.com/v1///"),
            "https://api.example.com/v1/"
        );

        // Whitespace from text entry is dropped
        assert_eq!(
            normalize_base_url("  http://localhost:11434  "),
            "http://localhost:11434/"
        );

        assert_eq!(normalize_base_url(""), "");
        assert_eq!(normalize_base_url("   "), "");
    }

    #[test]
    fn normalization_is_idempotent() {
        let samples = [
            "",
            "/",
            "///",
            "https://api.openai.com",
            "https://api.openai.com/",
            "http://localhost:11434//",
            " http://10.0.0.2:8080/proxy ",
        ];
        for sample in samples {
            let once = normalize_base_url(sample);
            assert_eq!(normalize_base_url(&once), once, "input: {sample:?}");
        }
    }

    #[test]
    fn effective_base_url_falls_back_to_default() {
        assert_eq!(effective_base_url(""), DEFAULT_BASE_URL);
        assert_eq!(effective_base_url("  "), DEFAULT_BASE_URL);
        assert_eq!(
            effective_base_url("http://localhost:11434"),
            "http://localhost:11434/"
        );
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("https://api.openai.com/", "v1/models"),
            "https://api.openai.com/v1/models"
        );

        // Endpoint with leading slash
        assert_eq!(
            construct_api_url("https://api.openai.com", "/v1/chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );

        // Path prefixes on the base are preserved
        assert_eq!(
            construct_api_url("https://gateway.example.com/openai//", "v1/models"),
            "https://gateway.example.com/openai/v1/models"
        );

        // Empty base goes to the default endpoint
        assert_eq!(
            construct_api_url("", "v1/models"),
            "https://api.openai.com/v1/models"
        );
    }
}
