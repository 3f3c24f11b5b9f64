//! String helpers shared by every trigger type: delimited-field splitting,
//! lenient boolean parsing and metric-name normalization.

use sha2::{Digest, Sha256};

/// Split `s` on `sep` and trim surrounding whitespace from every token.
///
/// Empty tokens are kept in place, so `"a;;b"` yields `["a", "", "b"]`.
/// Callers decide what an empty token means for their field.
pub fn split_and_trim(s: &str, sep: char) -> Vec<String> {
    s.split(sep).map(|t| t.trim().to_string()).collect()
}

/// Parse a boolean the way trigger metadata has always accepted it:
/// `1 t T TRUE true True` and `0 f F FALSE false False`.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

/// Replace every character that is not allowed in a published metric name
/// with `-`. Allowed: ASCII alphanumerics, `-` and `_`.
pub fn normalize_string(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Build a collision-free metric name of the form `{prefix}-{normalized}`.
///
/// Normalization is lossy (`a.b` and `a/b` both become `a-b`), so when it
/// changed anything a short digest of the raw name is appended.
pub fn metric_name(prefix: &str, raw: &str) -> String {
    let normalized = normalize_string(raw);
    if normalized == raw {
        return format!("{prefix}-{normalized}");
    }
    let digest = Sha256::digest(raw.as_bytes());
    let short: String = digest[..4].iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{normalized}-{short}")
}

/// Prefix a metric name with its disambiguating index: `s{index}-{name}`.
pub fn metric_name_with_index(index: i64, name: &str) -> String {
    format!("s{index}-{name}")
}
