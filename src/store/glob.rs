//! Translate a shell-style glob (`*`, `?`) over URLs into a SQL `LIKE`
//! pattern. `%` and `_` are SQL wildcards but not glob wildcards, so any
//! literal occurrence in the input has to be escaped before the glob
//! characters are substituted in, or a URL containing an underscore would
//! match more than the user asked for.

const ESCAPE: char = '\\';

/// Returns the `LIKE` pattern and the escape character to pass as
/// `LIKE ?1 ESCAPE ?2`.
pub fn glob_to_like(pattern: &str) -> (String, char) {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' | '_' | ESCAPE => {
                out.push(ESCAPE);
                out.push(c);
            }
            '*' => out.push('%'),
            '?' => out.push('_'),
            other => out.push(other),
        }
    }
    (out, ESCAPE)
}
