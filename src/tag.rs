//! Parser for the semicolon separated `key=value` field tag.
//!
//! ```text
//! env=TIMEOUT;default=100ms;usage=Request timeout;short=t;required
//! ```
//!
//! Recognised keys are `default`, `usage`, `env`, `url`, `short` and
//! `required`. Unknown keys are ignored so newer tags keep working with older
//! releases.

use std::fmt;

/// Metadata extracted from one field tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMeta {
    /// Literal default, parsed for the field's kind at registration time
    pub default: Option<String>,
    /// Help text shown next to the flag
    pub usage: String,
    /// Explicit environment variable name
    pub env: Option<String>,
    /// Key in an external source namespace, distinct from the environment
    pub url: Option<String>,
    /// Single character flag alias
    pub short: Option<char>,
    /// Informational only, enforcement belongs to `Config::validate`
    pub required: bool,
}

/// A tag segment that could not be understood
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagError {
    pub segment: String,
    pub reason: &'static str,
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}': {}", self.segment, self.reason)
    }
}

impl std::error::Error for TagError {}

const VALUE_KEYS: [&str; 5] = ["default", "usage", "env", "url", "short"];

/// Parse a raw tag string into [`FieldMeta`]
///
/// Segments are split on `;` and then on the first `=`, so values may
/// themselves contain `=`. Empty segments are skipped.
pub fn parse_tag(raw: &str) -> Result<FieldMeta, TagError> {
    let mut meta = FieldMeta::default();

    for segment in raw.split(';') {
        if segment.trim().is_empty() {
            continue;
        }

        let Some((key, value)) = segment.split_once('=') else {
            let key = segment.trim();
            if key == "required" {
                meta.required = true;
            } else if VALUE_KEYS.contains(&key) {
                return Err(TagError {
                    segment: segment.to_string(),
                    reason: "expected key=value",
                });
            }
            continue;
        };

        match key.trim() {
            "default" => meta.default = Some(value.to_string()),
            "usage" => meta.usage = value.to_string(),
            "env" => meta.env = non_empty(value),
            "url" => meta.url = non_empty(value),
            "short" => meta.short = parse_short(segment, value)?,
            "required" => meta.required = true,
            _ => {}
        }
    }

    Ok(meta)
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_short(segment: &str, value: &str) -> Result<Option<char>, TagError> {
    let value = value.trim();
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) if c.is_ascii_alphanumeric() => Ok(Some(c)),
        _ => Err(TagError {
            segment: segment.to_string(),
            reason: "short must be a single alphanumeric character",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_tag() {
        let meta =
            parse_tag("env=TIMEOUT;default=100ms;usage=Timeout for service;short=t;url=svc/timeout;required")
                .unwrap();

        assert_eq!(meta.env.as_deref(), Some("TIMEOUT"));
        assert_eq!(meta.default.as_deref(), Some("100ms"));
        assert_eq!(meta.usage, "Timeout for service");
        assert_eq!(meta.short, Some('t'));
        assert_eq!(meta.url.as_deref(), Some("svc/timeout"));
        assert!(meta.required);
    }

    #[test]
    fn test_leading_semicolon_is_skipped() {
        let meta = parse_tag(";default=my name;usage=Give me a name").unwrap();
        assert_eq!(meta.default.as_deref(), Some("my name"));
        assert_eq!(meta.usage, "Give me a name");
        assert!(!meta.required);
    }

    #[test]
    fn test_value_may_contain_equals() {
        let meta = parse_tag(r#"default={"a":"b=c"}"#).unwrap();
        assert_eq!(meta.default.as_deref(), Some(r#"{"a":"b=c"}"#));
    }

    #[test]
    fn test_empty_tag() {
        assert_eq!(parse_tag("").unwrap(), FieldMeta::default());
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let meta = parse_tag("future=1;flagless;default=5").unwrap();
        assert_eq!(meta.default.as_deref(), Some("5"));
    }

    #[test]
    fn test_known_key_without_value_is_malformed() {
        let err = parse_tag("default=1;usage").unwrap_err();
        assert_eq!(err.segment, "usage");
        assert!(err.to_string().contains("expected key=value"));
    }

    #[test]
    fn test_empty_default_is_kept() {
        let meta = parse_tag("default=").unwrap();
        assert_eq!(meta.default.as_deref(), Some(""));
    }

    #[test]
    fn test_short_must_be_single_char() {
        assert!(parse_tag("short=ab").is_err());
        assert_eq!(parse_tag("short=").unwrap().short, None);
    }
}
