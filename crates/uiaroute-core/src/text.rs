//! String escaping for the backend's single-quoted literal syntax.

/// Escapes every single quote in `text` with a backslash.
///
/// The UIA backend evaluates arguments inside single-quoted literals, so an
/// unescaped `'` would terminate the literal early.
pub fn escape_single_quotes(text: &str) -> String {
    text.replace('\'', "\\'")
}

/// Escapes a string for use as a quoted UIA argument.
///
/// Quotes are escaped first; raw newlines left after that step become the
/// two-character sequence `\n`. The order matters: a backslash introduced by
/// quote escaping must not be touched by the newline pass.
pub fn escape_uia_string(text: &str) -> String {
    escape_single_quotes(text).replace('\n', "\\n")
}
