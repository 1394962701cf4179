//! Standard citations in documentation comments
//!
//! Comments cite the standard as
//! `\fromStandard{\source[n1570]{\para{7.22.3.4}{2}}}{ excerpt }`.

use crate::regex;
use axiom_model::StandardRef;

const CITATION_MACRO: &str = r"\fromStandard";

/// Extract the first paragraph citation from a comment
pub fn parse_citation(comment: &str) -> Option<StandardRef> {
    let caps = regex!(r"\\source\[([^\]]+)\]\s*\{\s*\\para\{([^}]+)\}\{([^}]+)\}").captures(comment)?;
    let source = caps[1].trim().to_string();
    let section = caps[2].trim().to_string();
    let paragraph = caps[3].trim().to_string();

    let text = citation_excerpt(comment)
        .map(clean_markup)
        .unwrap_or_default();

    Some(StandardRef {
        source,
        section,
        paragraph,
        text,
    })
}

/// The brace group following the citation's source group
fn citation_excerpt(comment: &str) -> Option<&str> {
    let start = comment.find(CITATION_MACRO)? + CITATION_MACRO.len();
    let rest = &comment[start..];
    let (_, after_source) = balanced_group(rest)?;
    let (text, _) = balanced_group(&rest[after_source..])?;
    Some(text)
}

/// Find the first `{...}` group in `s`, honouring nesting.
///
/// Returns the inner text and the byte offset just past the closing brace.
/// Only whitespace may precede the opening brace.
pub fn balanced_group(s: &str) -> Option<(&str, usize)> {
    let open = s.find('{')?;
    if !s[..open].trim().is_empty() {
        return None;
    }
    let mut depth = 0usize;
    for (idx, ch) in s[open..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let close = open + idx;
                    return Some((&s[open + 1..close], close + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip inline formatting macros and collapse whitespace
pub fn clean_markup(text: &str) -> String {
    let mut current = text.to_string();
    // Innermost macros first, until nothing changes
    loop {
        let next = regex!(r"\\[A-Za-z]+\{([^{}]*)\}")
            .replace_all(&current, "$1")
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    let current = regex!(r"\\[A-Za-z]+").replace_all(&current, "");
    let current = current.replace("*/", "");
    current.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The function a citation describes, from `The \cinline{name} function`
pub fn cited_function(comment: &str) -> Option<String> {
    regex!(r"\\cinline\{([A-Za-z_][A-Za-z0-9_]*)\}\s+(?:function|macro)")
        .captures(comment)
        .map(|c| c[1].to_string())
}
