//! Small string helpers: whitespace stripping and case conversion.

/// Removes every whitespace character from `value`.
pub fn strip_whitespace(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Converts `value` to kebab-case (`"Foo bar"` -> `"foo-bar"`).
pub fn kebab_case(value: &str) -> String {
    words(value)
        .iter()
        .map(|word| word.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// Converts `value` to camelCase (`"foo bar"` -> `"fooBar"`).
pub fn camel_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for (index, word) in words(value).iter().enumerate() {
        let lower = word.to_lowercase();
        if index == 0 {
            out.push_str(&lower);
            continue;
        }
        let mut chars = lower.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

// Splits on any non-alphanumeric character and on lower-to-upper case
// boundaries, so "fooBar", "foo_bar" and "Foo bar" all yield [foo, bar].
fn words(value: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for c in value.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_numeric();
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}
