use crate::frontmatter::split_frontmatter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    /// Byte offset of the heading line.
    pub start: usize,
    /// Byte offset just past the heading line, newline included.
    pub line_end: usize,
}

/// Span of a header-delimited section, header line included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub start: usize,
    pub end: usize,
    pub level: usize,
    pub has_next: bool,
}

/// How the configured header is matched. `## Daily Record` pins the level,
/// a bare `Daily Record` matches the text at any level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderMatcher {
    Exact { level: usize, text: String },
    Text(String),
}

impl HeaderMatcher {
    pub fn parse(configured: &str) -> Self {
        let trimmed = configured.trim();
        match parse_atx(trimmed) {
            Some((level, text)) => Self::Exact {
                level,
                text: text.to_string(),
            },
            None => Self::Text(trimmed.to_string()),
        }
    }

    fn matches(&self, heading: &Heading) -> bool {
        match self {
            Self::Exact { level, text } => heading.level == *level && heading.text == *text,
            Self::Text(text) => heading.text == *text,
        }
    }

    /// Header line used when the section has to be created.
    pub fn new_header_line(&self) -> String {
        match self {
            Self::Exact { level, text } => format!("{} {text}", "#".repeat(*level)),
            Self::Text(text) => format!("## {text}"),
        }
    }
}

/// Parses an ATX heading line into level and text.
fn parse_atx(line: &str) -> Option<(usize, &str)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.len() - rest.trim_start_matches('#').len();
    if level == 0 || level > 6 {
        return None;
    }
    let rest = &rest[level..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }

    let mut text = rest.trim();
    // Optional closing sequence: `## Title ##`.
    let without_closing = text.trim_end_matches('#');
    if without_closing.len() != text.len()
        && (without_closing.is_empty() || without_closing.ends_with([' ', '\t']))
    {
        text = without_closing.trim_end();
    }
    Some((level, text))
}

fn is_fence(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// Headings of the note body. Front matter and fenced code are skipped.
pub fn headings(markdown: &str) -> Vec<Heading> {
    let (_, body_start) = split_frontmatter(markdown);
    let mut out = Vec::new();
    let mut in_fence = false;
    let mut offset = body_start;
    for line in markdown[body_start..].split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        if is_fence(line) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some((level, text)) = parse_atx(line) {
            out.push(Heading {
                level,
                text: text.to_string(),
                start,
                line_end: offset,
            });
        }
    }
    out
}

pub fn find_section(markdown: &str, matcher: &HeaderMatcher) -> Option<SectionSpan> {
    let all = headings(markdown);
    let idx = all.iter().position(|h| matcher.matches(h))?;
    let level = all[idx].level;
    let next = all[idx + 1..].iter().find(|h| h.level <= level);
    Some(SectionSpan {
        start: all[idx].start,
        end: next.map(|h| h.start).unwrap_or(markdown.len()),
        level,
        has_next: next.is_some(),
    })
}

fn render_block(header_line: &str, lines: &[String], has_next: bool) -> String {
    let mut block = String::new();
    block.push_str(header_line);
    block.push('\n');
    for line in lines {
        block.push_str(line);
        block.push('\n');
    }
    if has_next {
        block.push('\n');
    }
    block
}

/// Replaces the section body with `lines`, appending the section at the end
/// of the note when it does not exist yet. Returns `None` when there is
/// nothing to write: no section and nothing to render.
///
/// The output is a pure function of the input, so applying the same lines
/// twice yields the same text.
pub fn upsert_section(markdown: &str, matcher: &HeaderMatcher, lines: &[String]) -> Option<String> {
    if let Some(span) = find_section(markdown, matcher) {
        let header_line = markdown[span.start..]
            .split_inclusive('\n')
            .next()
            .unwrap_or_default()
            .trim_end_matches(['\r', '\n']);
        let block = render_block(header_line, lines, span.has_next);
        let mut out = String::with_capacity(markdown.len() + block.len());
        out.push_str(&markdown[..span.start]);
        out.push_str(&block);
        out.push_str(&markdown[span.end..]);
        return Some(out);
    }

    if lines.is_empty() {
        return None;
    }

    let mut out = markdown.to_string();
    if !out.is_empty() {
        if !out.ends_with('\n') {
            out.push('\n');
        }
        if !out.ends_with("\n\n") {
            out.push('\n');
        }
    }
    out.push_str(&render_block(&matcher.new_header_line(), lines, false));
    Some(out)
}
