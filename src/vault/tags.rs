use crate::frontmatter::split_frontmatter;

/// Strips the leading `#`; tag case is preserved.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let t = raw.trim();
    let t = t.strip_prefix('#').unwrap_or(t).trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Tags declared in the note's front matter `tags` key. Accepts a list, a
/// single string, or a comma/space separated string.
pub fn parse_frontmatter_tags(markdown: &str) -> Vec<String> {
    let markdown = markdown.strip_prefix('\u{feff}').unwrap_or(markdown);
    let (Some(yaml), _) = split_frontmatter(markdown) else {
        return Vec::new();
    };
    let v: serde_yaml::Value = match serde_yaml::from_str(yaml) {
        Ok(v) => v,
        Err(_) => return Vec::new(),
    };
    let mut out = Vec::new();
    if let Some(tags_val) = extract_tags_value(&v) {
        collect_tags_from_yaml_value(tags_val, &mut out);
    }
    let mut seen = std::collections::HashSet::new();
    out.retain(|t| seen.insert(t.clone()));
    out
}

fn extract_tags_value(value: &serde_yaml::Value) -> Option<&serde_yaml::Value> {
    let map = value.as_mapping()?;
    map.iter().find_map(|(key, val)| {
        key.as_str()
            .filter(|k| k.eq_ignore_ascii_case("tags"))
            .map(|_| val)
    })
}

fn collect_tags_from_yaml_value(value: &serde_yaml::Value, out: &mut Vec<String>) {
    match value {
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                collect_tags_from_yaml_value(item, out);
            }
        }
        serde_yaml::Value::String(s) => {
            let parts: Vec<&str> = if s.contains(',') {
                s.split(',').collect()
            } else {
                s.split_whitespace().collect()
            };
            out.extend(parts.into_iter().filter_map(normalize_tag));
        }
        serde_yaml::Value::Number(n) => {
            out.extend(normalize_tag(&n.to_string()));
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_list_and_string_forms() {
        let list = "---\ntags:\n  - \"#work/project-1\"\n  - work/Project-2\n---\nbody";
        assert_eq!(parse_frontmatter_tags(list), vec!["work/project-1", "work/Project-2"]);

        let string = "---\nTags: \"#daily, journal\"\n---\n";
        assert_eq!(parse_frontmatter_tags(string), vec!["daily", "journal"]);
    }

    #[test]
    fn no_front_matter_means_no_tags() {
        assert!(parse_frontmatter_tags("# Title\n#inline\n").is_empty());
        assert!(parse_frontmatter_tags("---\ntags: [unclosed\n---\n").is_empty());
    }
}
