//! Storage-path token rewriting.
//!
//! The catalog hands out obfuscated storage paths. A fixed, ordered list of
//! substring substitutions turns them into fetchable URLs. Order matters:
//! each rule sees the output of the previous one.

/// Ordered (pattern, replacement) pairs.
pub static REWRITE_RULES: &[(&str, &str)] = &[
    ("zsfwsecret", "218.2.107.93"),
    ("csfwsecret", "172.17.150.27"),
    ("345687", "/document/"),
    ("456798", "/picture/"),
    ("abcdfe", "/default/"),
    ("jpg0", ".png"),
];

/// Apply `rules` to `token` in sequence.
pub fn apply_rules(token: &str, rules: &[(&str, &str)]) -> String {
    rules
        .iter()
        .fold(token.to_string(), |acc, (pattern, replacement)| {
            acc.replace(pattern, replacement)
        })
}

/// Rewrite a catalog storage path with the default rule set.
pub fn rewrite_location(token: &str) -> String {
    apply_rules(token, REWRITE_RULES)
}
