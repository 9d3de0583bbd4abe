//! Utility functions for authentication.

/// Validate email address format.
///
/// This performs basic RFC 5322 validation:
/// - Must contain exactly one `@`
/// - Must have non-empty local and domain parts
/// - Domain must contain a dot, with no empty labels
/// - Length must be between 3 and 255 characters
///
/// # Examples
///
/// ```
/// use evently_auth::utils::is_valid_email;
///
/// assert!(is_valid_email("a@x.com"));
/// assert!(is_valid_email("user+tag@subdomain.example.com"));
/// assert!(!is_valid_email("invalid"));
/// assert!(!is_valid_email("@example.com"));
/// assert!(!is_valid_email("user@"));
/// ```
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.len() < 3 || email.len() > 255 {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }

    let valid_local_chars =
        |c: char| c.is_alphanumeric() || matches!(c, '.' | '-' | '+' | '_');
    let valid_domain_chars = |c: char| c.is_alphanumeric() || matches!(c, '.' | '-');

    local.chars().all(valid_local_chars)
        && domain.chars().all(valid_domain_chars)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

/// Canonical form of an email used as the login key.
///
/// # Examples
///
/// ```
/// use evently_auth::utils::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
