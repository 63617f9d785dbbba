//! Fenced code detection in assistant replies.
//!
//! A fence opens with three backticks and an optional bare language tag and
//! closes with three backticks. Matching is greedy: the first opener pairs with
//! the last closer, so several fences in one reply come back as a single block
//! spanning all of them.

use std::sync::OnceLock;

use regex::Regex;

fn code_block_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"(?s)```([A-Za-z0-9]+)?(.*)```").expect("code block regex must compile")
    })
}

#[must_use]
pub fn has_code(text: &str) -> bool {
    code_block_regex().is_match(text)
}

/// Tag written right after the first opening fence, or an empty string.
#[must_use]
pub fn extract_language_tag(text: &str) -> String {
    code_block_regex()
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|tag| tag.as_str().to_string())
        .unwrap_or_default()
}

/// Cleaned bodies of every fenced region, in order.
#[must_use]
pub fn extract_blocks(text: &str) -> Vec<String> {
    code_block_regex()
        .captures_iter(text)
        .filter_map(|captures| captures.get(2))
        .map(|body| clean_block(body.as_str()))
        .collect()
}

/// Unescapes literal `\n` and `\"` sequences and trims the result.
#[must_use]
pub fn clean_block(raw: &str) -> String {
    raw.replace("\\n", "\n")
        .replace("\\\"", "\"")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_has_no_code() {
        let text = "Just prose, with a single ` backtick.";
        assert!(!has_code(text));
        assert_eq!(extract_language_tag(text), "");
        assert!(extract_blocks(text).is_empty());
    }

    #[test]
    fn tagged_block_yields_tag_and_trimmed_body() {
        let text = "Here you go:\n```python\nprint('hi')\n```\nEnjoy.";

        assert!(has_code(text));
        assert_eq!(extract_language_tag(text), "python");
        assert_eq!(extract_blocks(text), vec!["print('hi')".to_string()]);
    }

    #[test]
    fn untagged_block_has_empty_tag() {
        let text = "```\nls -la\n```";
        assert_eq!(extract_language_tag(text), "");
        assert_eq!(extract_blocks(text), vec!["ls -la".to_string()]);
    }

    #[test]
    fn two_fences_collapse_into_one_greedy_block() {
        let text = "```a``` and ```b```";

        assert_eq!(extract_language_tag(text), "a");
        assert_eq!(extract_blocks(text), vec!["``` and ```b".to_string()]);
    }

    #[test]
    fn escaped_newlines_and_quotes_are_unescaped() {
        let text = r#"```js\nconsole.log(\"x\");\n```"#;

        assert_eq!(extract_language_tag(text), "js");
        assert_eq!(
            extract_blocks(text),
            vec!["console.log(\"x\");".to_string()]
        );
    }

    #[test]
    fn tag_stops_at_first_non_alphanumeric() {
        let text = "```c++\nint x;\n```";
        assert_eq!(extract_language_tag(text), "c");
        assert_eq!(extract_blocks(text), vec!["++\nint x;".to_string()]);
    }

    #[test]
    fn rescanning_is_repeatable() {
        let text = "```rust\nfn main() {}\n```";
        assert_eq!(extract_blocks(text), extract_blocks(text));
    }
}
