//! Naming helpers for physical identifiers

/// Convert a class-style name to snake_case
///
/// Consecutive uppercase letters collapse into one word, so acronyms stay
/// together: `MyAPIKey` becomes `my_apikey`.
pub fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    let mut prev_is_upper = false;

    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 && !prev_is_upper {
                result.push('_');
            }
            result.extend(c.to_lowercase());
            prev_is_upper = true;
        } else if c == '-' || c == ' ' {
            result.push('_');
            prev_is_upper = false;
        } else {
            result.push(c);
            prev_is_upper = false;
        }
    }

    result
}
