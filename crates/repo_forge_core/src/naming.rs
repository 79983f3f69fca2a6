//! Identifier normalization for environment-variable names.

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;

/// Converts an identifier to `UPPER_SNAKE_CASE`.
///
/// Handles camelCase, PascalCase, snake_case, kebab-case, and acronym runs
/// (`APIKey` becomes `API_KEY`, `HTTPSConnection` becomes `HTTPS_CONNECTION`).
/// Any character that is not ASCII alphanumeric acts as a separator; repeated
/// separators collapse. Idempotent, so already-normalized names pass through
/// unchanged.
pub fn to_upper_snake_case(identifier: &str) -> String {
    let chars: Vec<char> = identifier.chars().collect();
    let mut normalized = String::with_capacity(identifier.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !normalized.is_empty() && !normalized.ends_with('_') {
                normalized.push('_');
            }
            continue;
        }

        if i > 0 && !normalized.is_empty() && !normalized.ends_with('_') {
            let prev = chars[i - 1];
            let word_boundary = (prev.is_ascii_lowercase() && c.is_ascii_uppercase())
                || (prev.is_ascii_alphabetic() && c.is_ascii_digit())
                || (prev.is_ascii_uppercase()
                    && c.is_ascii_uppercase()
                    && chars.get(i + 1).is_some_and(|next| next.is_ascii_lowercase()));
            if word_boundary {
                normalized.push('_');
            }
        }

        normalized.push(c.to_ascii_uppercase());
    }

    normalized.trim_end_matches('_').to_string()
}
