//! URL extraction from message content

use regex::Regex;

/// Find the first HTTP(S) URL in a message
///
/// The match is greedy and stops at whitespace or a double quote; at least
/// two characters must follow the scheme.
pub fn first_url(content: &str) -> Option<&str> {
    let url_regex = Regex::new(r#"https?://[^\s"]{2,}"#).expect("Invalid URL regex");
    url_regex.find(content).map(|m| m.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_url_basic() {
        let content = "check this out https://example.com/a";
        assert_eq!(first_url(content), Some("https://example.com/a"));
    }

    #[test]
    fn test_first_url_none() {
        assert_eq!(first_url("no link here"), None);
        assert_eq!(first_url(""), None);
    }

    #[test]
    fn test_first_url_stops_at_double_quote() {
        let content = r#"see http://x.co/a"b"#;
        assert_eq!(first_url(content), Some("http://x.co/a"));
    }

    #[test]
    fn test_first_url_stops_at_whitespace() {
        let content = "https://example.com/story and more text";
        assert_eq!(first_url(content), Some("https://example.com/story"));

        let content = "https://example.com/story\nsecond line";
        assert_eq!(first_url(content), Some("https://example.com/story"));
    }

    #[test]
    fn test_first_url_requires_two_characters_after_scheme() {
        assert_eq!(first_url("https://x"), None);
        assert_eq!(first_url("https://xy"), Some("https://xy"));
    }

    #[test]
    fn test_first_url_takes_first_of_many() {
        let content = "https://first.example https://second.example";
        assert_eq!(first_url(content), Some("https://first.example"));
    }
}
