//! Hex program file loading.
//!
//! Programs are plain text files of 32-bit words in hexadecimal:
//! - Words separated by whitespace or newlines
//! - An optional `0x` prefix per word
//! - `#` and `;` start a comment running to end of line
//! - Blank lines are ignored
//!
//! Example (factorial of 5):
//!
//! ```text
//! # n = 5, result = 1
//! 0x20080005 0x20090001
//! 0x11000004 0x01280018 0x00004812 0x2108FFFF 0x08100002
//! ```

use std::path::Path;
use thiserror::Error;

/// Parse hex words from program text.
pub fn parse_hex(source: &str) -> Result<Vec<u32>, LoaderError> {
    let mut words = Vec::new();

    for (line_num, line) in source.lines().enumerate() {
        // Strip comments
        let code = line
            .split(|c| c == '#' || c == ';')
            .next()
            .unwrap_or("");

        for token in code.split_whitespace() {
            let digits = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);

            let word = u32::from_str_radix(digits, 16).map_err(|_| LoaderError::BadWord {
                line: line_num + 1,
                token: token.to_string(),
            })?;
            words.push(word);
        }
    }

    Ok(words)
}

/// Load a hex program file from disk.
pub fn load_hex<P: AsRef<Path>>(path: P) -> Result<Vec<u32>, LoaderError> {
    let source = std::fs::read_to_string(path.as_ref())
        .map_err(|e| LoaderError::Io(e.to_string()))?;
    parse_hex(&source)
}

/// Errors that can occur while loading a hex program file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoaderError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("line {line}: not a 32-bit hex word: {token:?}")]
    BadWord { line: usize, token: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_words() {
        let words = parse_hex("20080005 01084820").unwrap();
        assert_eq!(words, vec![0x2008_0005, 0x0108_4820]);
    }

    #[test]
    fn test_parse_prefixed_and_multiline() {
        let source = "0x20080005\n0x20090001\n";
        let words = parse_hex(source).unwrap();
        assert_eq!(words, vec![0x2008_0005, 0x2009_0001]);
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let source = "\
# factorial setup
0x20080005  ; n = 5

; nothing on this line
0x20090001
";
        let words = parse_hex(source).unwrap();
        assert_eq!(words, vec![0x2008_0005, 0x2009_0001]);
    }

    #[test]
    fn test_bad_word_reports_line() {
        let err = parse_hex("20080005\nnotahex\n").unwrap_err();
        assert_eq!(
            err,
            LoaderError::BadWord {
                line: 2,
                token: "notahex".to_string(),
            }
        );
    }

    #[test]
    fn test_word_too_wide() {
        assert!(parse_hex("0x100000000").is_err());
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse_hex("").unwrap(), Vec::<u32>::new());
    }
}
