//! User token used to namespace server-side result objects

use once_cell::sync::Lazy;
use regex::Regex;

/// Token used when the user name sanitizes to nothing
pub const FALLBACK_TOKEN: &str = "Temp";

static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\-]").unwrap());

/// A sanitized user identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserToken {
    pub token: String,
    /// True when the fallback token replaced an empty name
    pub substituted: bool,
}

impl UserToken {
    /// Sanitize an OS user name: characters outside `[A-Za-z0-9_-]` become
    /// `_`, then hyphens become `_`; an empty result becomes `Temp`.
    pub fn from_user_name(raw: &str) -> Self {
        let token = DISALLOWED
            .replace_all(raw.trim(), "_")
            .replace('-', "_");

        if token.is_empty() {
            Self {
                token: FALLBACK_TOKEN.to_string(),
                substituted: true,
            }
        } else {
            Self {
                token,
                substituted: false,
            }
        }
    }
}

/// User name reported by the OS environment
pub fn os_user_name() -> String {
    std::env::var("USERNAME")
        .or_else(|_| std::env::var("USER"))
        .unwrap_or_default()
}
