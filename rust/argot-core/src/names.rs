//! Identifier-case helpers shared by the back-ends.
//!
//! Naming conventions are applied in the transformers (snake_case members in
//! Ruby and C, PascalCase classes everywhere, SCREAMING_SNAKE_CASE Ruby
//! constants); these routines are the single implementation they share.

/// `camelCase` / `PascalCase` / `kebab-ish` → `snake_case`.
pub fn to_snake_case(name: &str) -> String {
    let trimmed = name.trim_start_matches('_');
    let mut out = String::with_capacity(trimmed.len() + 4);
    let mut prev_lower = false;
    let mut prev_digit = false;
    for ch in trimmed.chars() {
        if ch.is_ascii_uppercase() {
            if prev_lower || prev_digit {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
            prev_lower = false;
            prev_digit = false;
        } else if ch == '-' || ch == ' ' {
            out.push('_');
            prev_lower = false;
            prev_digit = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_ascii_lowercase();
            prev_digit = ch.is_ascii_digit();
        }
    }
    out
}

/// `snake_case` / `camelCase` → `PascalCase`.
pub fn to_pascal_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.trim_start_matches('_').chars() {
        if ch == '_' || ch == '-' || ch == ' ' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

/// `camelCase` / `PascalCase` → `SCREAMING_SNAKE_CASE`.
pub fn to_screaming_snake_case(name: &str) -> String {
    to_snake_case(name).to_ascii_uppercase()
}

/// `snake_case` / `PascalCase` → `camelCase`.
pub fn to_camel_case(name: &str) -> String {
    let pascal = to_pascal_case(name);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_ascii_lowercase().to_string() + chars.as_str(),
        None => pascal,
    }
}

/// Drop the leading-underscore privacy marker; targets with their own
/// visibility convention (Ruby `@x`) re-add it in their own spelling.
pub fn strip_privacy_prefix(name: &str) -> &str {
    name.trim_start_matches('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("keySize"), "key_size");
        assert_eq!(to_snake_case("RotL32"), "rot_l32");
        assert_eq!(to_snake_case("_roundKeys"), "round_keys");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("HTTPServer"), "httpserver");
    }

    #[test]
    fn test_pascal_case() {
        assert_eq!(to_pascal_case("block_cipher"), "BlockCipher");
        assert_eq!(to_pascal_case("sha256"), "Sha256");
        assert_eq!(to_pascal_case("AlreadyPascal"), "AlreadyPascal");
    }

    #[test]
    fn test_screaming_snake_case() {
        assert_eq!(to_screaming_snake_case("maxRounds"), "MAX_ROUNDS");
        assert_eq!(to_screaming_snake_case("Sbox"), "SBOX");
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(to_camel_case("key_size"), "keySize");
        assert_eq!(to_camel_case("KeySize"), "keySize");
    }

    #[test]
    fn test_strip_privacy_prefix() {
        assert_eq!(strip_privacy_prefix("_state"), "state");
        assert_eq!(strip_privacy_prefix("state"), "state");
    }
}
