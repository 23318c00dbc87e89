/// Lowercase, dash-separated form of `input` for use in URLs.
///
/// Whitespace, `-` and `_` separate words; other punctuation is dropped.
/// Falls back to `"app"` when nothing usable is left.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    if slug.is_empty() {
        slug.push_str("app");
    }
    slug
}
