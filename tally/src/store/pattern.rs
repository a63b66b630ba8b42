use regex::Regex;

use crate::error::{Result, TallyError};

/// Compiled glob over bucket keys: `*` matches any run of characters, `?`
/// matches exactly one. Everything else is literal.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    glob: String,
    regex: Regex,
}

impl KeyPattern {
    pub fn new(glob: &str) -> Result<Self> {
        let regex = Regex::new(&glob_to_regex(glob)).map_err(|e| {
            TallyError::validation("pattern", format!("invalid key pattern: {e}"), Some(glob))
        })?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }

    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    out.push_str("(?s)^");

    let mut literal = [0u8; 4];
    for c in glob.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            c => out.push_str(&regex::escape(c.encode_utf8(&mut literal))),
        }
    }

    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(glob: &str, key: &str) -> bool {
        KeyPattern::new(glob).unwrap().matches(key)
    }

    #[test]
    fn test_prefix_patterns() {
        assert!(matches("activity:*", "activity:likes:CID1"));
        assert!(matches("activity:*", "activity:timestamp:likes:CID1:202401011015"));
        assert!(!matches("activity:*", "geo:activity:like"));
        assert!(matches("geo:activity:timestamp:*", "geo:activity:timestamp:like:202401011015"));
        assert!(!matches("geo:activity:timestamp:*", "geo:activity:like"));
    }

    #[test]
    fn test_wildcards() {
        assert!(matches("*", ""));
        assert!(matches("a*c", "abbbc"));
        assert!(matches("a?c", "abc"));
        assert!(!matches("a?c", "ac"));
        assert!(matches("*:views:*", "post:views:CID1:POST1"));
        assert!(!matches("abc", "abcd"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(matches("post:views:a.b:*", "post:views:a.b:POST1"));
        assert!(!matches("post:views:a.b:*", "post:views:axb:POST1"));
        assert!(matches("k(1)+[x]", "k(1)+[x]"));
        assert_eq!(KeyPattern::new("geo:*").unwrap().as_str(), "geo:*");
    }
}
