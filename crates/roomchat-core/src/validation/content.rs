use crate::error::DomainError;

pub const MAX_CONTENT_CHARS: usize = 2000;

/// Check length (1-2000 characters) and return the HTML-escaped text to store
///
/// Length is measured on the raw input. Whitespace-only content is rejected;
/// otherwise the text is kept as typed.
pub fn validate_content(content: &str) -> Result<String, DomainError> {
    if content.trim().is_empty() {
        return Err(DomainError::ContentEmpty);
    }
    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(DomainError::ContentTooLong {
            max: MAX_CONTENT_CHARS,
        });
    }
    Ok(escape_html(content))
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Entities produced by [`escape_html`]
const ENTITIES: [(&str, char); 5] = [
    ("&amp;", '&'),
    ("&lt;", '<'),
    ("&gt;", '>'),
    ("&quot;", '"'),
    ("&#39;", '\''),
];

/// Inverse of [`escape_html`], for surfaces that show plain text (push bodies)
///
/// Unknown `&...;` sequences are left as they are.
pub fn unescape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(at) = rest.find('&') {
        out.push_str(&rest[..at]);
        rest = &rest[at..];
        match ENTITIES.iter().find(|(entity, _)| rest.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// `#RRGGBB`
pub fn validate_bubble_color(color: &str) -> Result<(), DomainError> {
    let valid = color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit());
    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidBubbleColor(color.to_string()))
    }
}
