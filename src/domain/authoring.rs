//! Display metadata derived from a markdown body at authoring time.
//!
//! The listing never recomputes these values; they are filled in when a
//! record is seeded and stored alongside it.

const WORDS_PER_MINUTE: usize = 200;

/// Metadata extracted from a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownMetadata {
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub read_time_minutes: u32,
}

pub fn extract_metadata(markdown: &str) -> MarkdownMetadata {
    let lines: Vec<&str> = markdown.lines().collect();
    let heading = lines
        .iter()
        .position(|line| heading_text(line).is_some());

    let title = heading.and_then(|index| heading_text(lines[index]).map(str::to_string));
    let excerpt = heading.and_then(|index| lead_paragraph(&lines[index + 1..]));

    MarkdownMetadata {
        title,
        excerpt,
        read_time_minutes: estimate_read_minutes(markdown),
    }
}

/// Whole minutes needed to read `text`, never less than one.
pub fn estimate_read_minutes(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    let minutes = words.div_ceil(WORDS_PER_MINUTE).max(1);
    u32::try_from(minutes).unwrap_or(u32::MAX)
}

pub fn format_read_time(minutes: u32) -> String {
    format!("{minutes} min read")
}

pub fn fallback_excerpt(title: &str) -> String {
    format!("A comprehensive guide covering {title}")
}

/// Text of a level-one heading (`# Title`), if `line` is one.
fn heading_text(line: &str) -> Option<&str> {
    let rest = line.strip_prefix('#')?;
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn lead_paragraph(lines: &[&str]) -> Option<String> {
    let mut body = lines.iter().map(|line| line.trim()).skip_while(|line| line.is_empty());

    let first = body.next()?;
    if first == "---" || first.starts_with('#') {
        return None;
    }
    if let Some(quote) = emphasized_quote(first) {
        return Some(quote.to_string());
    }

    let mut paragraph = vec![first];
    for line in body {
        if line.is_empty() || line == "---" {
            break;
        }
        paragraph.push(line);
    }
    Some(paragraph.join(" "))
}

/// Inner text of a `> *lead*` blockquote line.
fn emphasized_quote(line: &str) -> Option<&str> {
    let quoted = line.strip_prefix('>')?.trim();
    let inner = quoted.strip_prefix('*')?.strip_suffix('*')?.trim();
    (!inner.is_empty()).then_some(inner)
}
