/// Splits leading YAML front matter from the body. Returns the front matter
/// text (without fences) and the byte offset where the body begins.
pub fn split_frontmatter(markdown: &str) -> (Option<&str>, usize) {
    for (open, closes) in [
        ("---\n", ["\n---\n", "\n---\r\n"]),
        ("---\r\n", ["\r\n---\r\n", "\r\n---\n"]),
    ] {
        let Some(rest) = markdown.strip_prefix(open) else {
            continue;
        };
        for close in closes {
            if let Some(idx) = rest.find(close) {
                return (Some(&rest[..idx]), open.len() + idx + close.len());
            }
        }
        // Front matter closed at EOF without a trailing newline.
        for close in ["\n---", "\r\n---"] {
            if rest.ends_with(close) {
                let idx = rest.len() - close.len();
                return (Some(&rest[..idx]), markdown.len());
            }
        }
        return (None, 0);
    }
    (None, 0)
}

#[cfg(test)]
mod tests {
    use super::split_frontmatter;

    #[test]
    fn finds_body_after_front_matter() {
        let md = "---\ntags: [daily]\n---\n# Title\n";
        let (fm, offset) = split_frontmatter(md);
        assert_eq!(fm, Some("tags: [daily]"));
        assert_eq!(&md[offset..], "# Title\n");
    }

    #[test]
    fn unterminated_front_matter_is_body() {
        let md = "---\ntags: [daily]\n# Title\n";
        assert_eq!(split_frontmatter(md), (None, 0));
        assert_eq!(split_frontmatter("# plain\n"), (None, 0));
    }

    #[test]
    fn front_matter_only_file() {
        let md = "---\na: 1\n---";
        let (fm, offset) = split_frontmatter(md);
        assert_eq!(fm, Some("a: 1"));
        assert_eq!(offset, md.len());
    }
}
