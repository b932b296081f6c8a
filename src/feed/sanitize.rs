use ammonia::Builder;
use std::collections::{HashMap, HashSet};

/// Elements kept through cleaning so their boundaries become word breaks
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "ol", "p",
    "pre", "section", "table", "td", "th", "tr", "ul",
];

/// Elements removed together with their content
const DROPPED_TAGS: &[&str] = &["script", "style", "noscript"];

fn cleaner() -> Builder<'static> {
    let mut builder = Builder::default();
    builder
        .tags(BLOCK_TAGS.iter().copied().collect())
        .clean_content_tags(DROPPED_TAGS.iter().copied().collect())
        .generic_attributes(HashSet::new())
        .tag_attributes(HashMap::new())
        .link_rel(None);
    builder
}

/// Removes all markup from an HTML fragment
///
/// Script and style bodies are dropped, block boundaries become spaces and
/// runs of whitespace collapse to a single space. The result is escaped
/// text: `<`, `>` and `&` never appear unescaped.
pub fn strip_tags(fragment: &str) -> String {
    if !fragment.contains(|c: char| matches!(c, '<' | '>' | '&')) {
        return collapse_whitespace(fragment);
    }

    let cleaned = cleaner().clean(fragment).to_string();

    // Only attribute-free block tags survive cleaning
    let mut text = String::with_capacity(cleaned.len());
    let mut in_tag = false;
    for c in cleaned.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(strip_tags("Just words"), "Just words");
    }

    #[test]
    fn test_tags_removed() {
        assert_eq!(
            strip_tags("<p>Hello <b>world</b></p><p>again</p>"),
            "Hello world again"
        );
        assert_eq!(strip_tags("<p>Hello</p>\n<p>again</p>"), "Hello again");
        assert_eq!(strip_tags("one<br>two<div>three</div>"), "one two three");
    }

    #[test]
    fn test_attributes_removed() {
        let text = strip_tags(r#"<img src="x.png" onerror="alert(1)">caption"#);
        assert_eq!(text, "caption");
    }

    #[test]
    fn test_escaped_markup_stays_escaped() {
        assert_eq!(
            strip_tags("<p>Hi &lt;script&gt;alert(1)&lt;/script&gt;</p>"),
            "Hi &lt;script&gt;alert(1)&lt;/script&gt;"
        );
        assert_eq!(strip_tags("a < b > c"), "a &lt; b &gt; c");
    }

    #[test]
    fn test_script_and_style_bodies_dropped() {
        assert_eq!(
            strip_tags("<p>Hi</p><script>steal()</script><style>p{}</style>"),
            "Hi"
        );
    }

    #[test]
    fn test_ampersand_escaped() {
        assert_eq!(strip_tags("Fish &amp; chips"), "Fish &amp; chips");
        assert_eq!(strip_tags("Fish & chips"), "Fish &amp; chips");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(strip_tags("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_empty() {
        assert_eq!(strip_tags(""), "");
    }
}
