//! Quote-state scanner for single-quoted pseudo-JSON.

/// Rewrite single quotes to double quotes outside double-quoted regions.
///
/// The scanner toggles its state on unescaped `"`; escaped characters are
/// copied through untouched.
pub fn normalize_single_quotes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_double = false;
    let mut escaped = false;
    for c in input.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => {
                escaped = true;
                out.push(c);
            }
            '"' => {
                in_double = !in_double;
                out.push(c);
            }
            '\'' if !in_double => out.push('"'),
            _ => out.push(c),
        }
    }
    out
}
