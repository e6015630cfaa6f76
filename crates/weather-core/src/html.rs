//! HTML escaping shared by the autocomplete endpoint and block rendering.

/// Escapes text for safe inclusion in HTML element content or quoted attributes.
///
/// `&`, `<`, `>`, `"` and `'` are replaced by `&amp;`, `&lt;`, `&gt;`,
/// `&quot;` and `&#039;`.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}
