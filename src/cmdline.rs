//! Locating the end of the program-path token in a raw command line.
//!
//! Windows hands every process its command line as one UTF-16 string. To
//! relaunch "everything after our own path" we only need to know where the first
//! token ends, so this is deliberately not a general argument parser: quotes
//! group spaces, and an odd run of backslashes before a quote escapes it.

const SPACE: u16 = b' ' as u16;
const BACKSLASH: u16 = b'\\' as u16;
const QUOTE: u16 = b'"' as u16;

/// Return the part of `raw` that follows the program-path token.
///
/// The returned slice starts at the first character of the first argument, so
/// any run of separating spaces is skipped. When no unquoted space ends the
/// first token (or nothing follows it) the result is empty.
///
/// # Examples
/// ```
/// use subcon::cmdline::strip_program_path;
///
/// let raw: Vec<u16> = r#""C:\Program Files\app.exe" --flag value"#.encode_utf16().collect();
/// let args = String::from_utf16_lossy(strip_program_path(&raw));
/// assert_eq!(args, "--flag value");
/// ```
pub fn strip_program_path(raw: &[u16]) -> &[u16] {
    let mut in_quotes = false;
    let mut backslashes = 0usize;
    let mut boundary_found = false;

    for (i, &unit) in raw.iter().enumerate() {
        match unit {
            SPACE => {
                if !in_quotes {
                    boundary_found = true;
                }
                backslashes = 0;
            }
            BACKSLASH => {
                if boundary_found {
                    return &raw[i..];
                }
                backslashes += 1;
            }
            QUOTE => {
                if boundary_found {
                    return &raw[i..];
                }
                if backslashes % 2 == 0 {
                    in_quotes = !in_quotes;
                }
                backslashes = 0;
            }
            _ => {
                if boundary_found {
                    return &raw[i..];
                }
                backslashes = 0;
            }
        }
    }

    &[]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strip(raw: &str) -> String {
        let units: Vec<u16> = raw.encode_utf16().collect();
        String::from_utf16_lossy(strip_program_path(&units))
    }

    #[rstest]
    #[case::plain("app.exe arg", "arg")]
    #[case::several_args("app.exe cmd.exe /c echo hi", "cmd.exe /c echo hi")]
    #[case::extra_spaces("app.exe    arg  two", "arg  two")]
    #[case::trailing_spaces_kept("app.exe arg  ", "arg  ")]
    #[case::windows_path(r"C:\tools\subcon.exe wsl.exe -e ls", "wsl.exe -e ls")]
    fn test_unquoted_path(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip(raw), expected);
    }

    #[rstest]
    #[case::spaces_in_path(r#""C:\Program Files\app.exe" --flag value"#, "--flag value")]
    #[case::no_spaces_in_path(r#""app.exe" arg"#, "arg")]
    #[case::quote_mid_token(r#""C:\Program Files"\app.exe arg"#, "arg")]
    #[case::quoted_first_arg(r#""C:\a b\app.exe" "quoted arg" x"#, r#""quoted arg" x"#)]
    fn test_quoted_path(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip(raw), expected);
    }

    #[test]
    fn test_escaped_quote_in_arguments_is_preserved() {
        // The backslash after the boundary starts the arguments region
        assert_eq!(strip(r#"app.exe \"literal\" rest"#), r#"\"literal\" rest"#);
    }

    #[rstest]
    // One or three backslashes escape the quote, so the space still ends the token
    #[case::one_backslash(r#"a\"b c"#, "c")]
    #[case::three_backslashes(r#"a\\\"b c"#, "c")]
    // Two backslashes leave the quote live; the space is then quoted content
    #[case::two_backslashes(r#"a\\"b c"#, "")]
    #[case::two_backslashes_closed(r#"a\\"b c"d e"#, "e")]
    fn test_backslash_runs_before_quote(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(strip(raw), expected);
    }

    #[test]
    fn test_backslash_run_must_be_adjacent_to_quote() {
        // `\app.exe"` - the backslash is separated from the closing quote by
        // ordinary characters, so the quote still closes the path.
        assert_eq!(strip(r#""C:\dir\app.exe" x"#), "x");
    }

    #[test]
    fn test_space_resets_backslash_run() {
        // `\ "` - the space between breaks the run, so the quote is not escaped
        // and is returned as the start of the arguments.
        assert_eq!(strip(r#"a\ "b""#), r#""b""#);
    }

    #[rstest]
    #[case::empty("")]
    #[case::only_token("onlytoken")]
    #[case::only_trailing_spaces("app.exe   ")]
    #[case::unterminated_quote(r#""C:\Program Files\app.exe arg"#)]
    fn test_no_arguments(#[case] raw: &str) {
        assert_eq!(strip(raw), "");
    }

    #[test]
    fn test_result_borrows_from_input() {
        let units: Vec<u16> = "app.exe arg".encode_utf16().collect();
        let args = strip_program_path(&units);
        assert!(std::ptr::eq(args.as_ptr(), units[8..].as_ptr()));
    }

    #[test]
    fn test_non_ascii_arguments() {
        assert_eq!(strip("app.exe échec ✅"), "échec ✅");
    }
}
