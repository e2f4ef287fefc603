//! Line-oriented token reader backing every ASCII format.
//!
//! The parser is a cursor over an immutable list of lines. Records are
//! `keyword value...` lines; groups are brace-delimited. Reading a line
//! advances the cursor by one, `skip_to` moves it forward without consuming
//! the matched line, and `tell`/`seek` give random access for look-ahead
//! passes such as reading a trailer before the body.

use std::io::SeekFrom;
use std::str::FromStr;

use crate::error::{DataError, Result};

/// Tokens older exporters wrote for NaN floats
const NAN_SENTINELS: [&str; 2] = ["-1.#QNAN0", "1.#QNAN0"];

/// Split a line the way a POSIX shell would: whitespace separated words,
/// single quotes are literal, double quotes allow backslash escapes.
pub fn split_tokens(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => current.push(ch),
                        None => return Err("no closing quotation".to_owned()),
                    }
                }
            }
            '"' => {
                in_token = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('\\' | '"' | '$' | '`' | '\n')) => current.push(ch),
                            Some(ch) => {
                                current.push('\\');
                                current.push(ch);
                            }
                            None => return Err("no closing quotation".to_owned()),
                        },
                        Some(ch) => current.push(ch),
                        None => return Err("no closing quotation".to_owned()),
                    }
                }
            }
            '\\' => {
                in_token = true;
                match chars.next() {
                    Some(ch) => current.push(ch),
                    None => return Err("no escaped character".to_owned()),
                }
            }
            ch if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            ch => {
                in_token = true;
                current.push(ch);
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// Parse a float token, mapping the legacy NaN spellings to NaN
pub fn parse_float(token: &str) -> Option<f32> {
    if NAN_SENTINELS.contains(&token) {
        return Some(f32::NAN);
    }
    token.parse().ok()
}

/// Cursor over the lines of an ASCII document
#[derive(Debug, Clone)]
pub struct TokenParser<'a> {
    lines: Vec<&'a str>,
    current: usize,
}

impl<'a> TokenParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            current: 0,
        }
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn is_eof(&self) -> bool {
        self.current >= self.lines.len()
    }

    /// Current line index (zero based)
    pub fn tell(&self) -> usize {
        self.current
    }

    /// Move the cursor. The result is clamped to `0..=line_count`.
    pub fn seek(&mut self, pos: SeekFrom) -> usize {
        let count = self.lines.len() as i64;
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).unwrap_or(i64::MAX),
            SeekFrom::Current(offset) => self.current as i64 + offset,
            SeekFrom::End(offset) => count + offset,
        };
        self.current = target.clamp(0, count) as usize;
        self.current
    }

    fn error(&self, message: impl Into<String>, tokens: &[String]) -> DataError {
        DataError::Parse {
            line: self.current,
            message: message.into(),
            tokens: tokens.to_vec(),
        }
    }

    /// Return the current line and advance
    pub fn read_line(&mut self) -> Result<&'a str> {
        let line = self
            .lines
            .get(self.current)
            .copied()
            .ok_or_else(|| self.error("unexpected end of input", &[]))?;
        self.current += 1;
        Ok(line)
    }

    /// Tokenize the current line and advance
    pub fn read_tokens(&mut self) -> Result<Vec<String>> {
        let line = self.read_line()?;
        split_tokens(line).map_err(|message| self.error(message, &[line.to_owned()]))
    }

    fn read_value_tokens(&mut self, what: &str) -> Result<Vec<String>> {
        let tokens = self.read_tokens()?;
        if tokens.len() < 2 {
            return Err(self.error(format!("failed to parse {what}"), &tokens));
        }
        Ok(tokens)
    }

    /// Read `keyword <int>`
    pub fn read_int<T: FromStr>(&mut self) -> Result<T> {
        let tokens = self.read_value_tokens("integer")?;
        tokens[1]
            .parse()
            .map_err(|_| self.error("failed to parse integer", &tokens))
    }

    /// Read `keyword <float>`
    pub fn read_float(&mut self) -> Result<f32> {
        let tokens = self.read_value_tokens("float")?;
        parse_float(&tokens[1]).ok_or_else(|| self.error("failed to parse float", &tokens))
    }

    /// Read `keyword <int> <int> ...`
    pub fn read_int_array<T: FromStr>(&mut self) -> Result<Vec<T>> {
        let tokens = self.read_tokens()?;
        if tokens.is_empty() {
            return Err(self.error("failed to parse int array", &tokens));
        }
        tokens[1..]
            .iter()
            .map(|token| token.parse())
            .collect::<std::result::Result<Vec<T>, _>>()
            .map_err(|_| self.error("failed to parse int array", &tokens))
    }

    /// Read `keyword <float> <float> ...`
    pub fn read_float_array(&mut self) -> Result<Vec<f32>> {
        let tokens = self.read_tokens()?;
        if tokens.is_empty() {
            return Err(self.error("failed to parse float array", &tokens));
        }
        tokens[1..]
            .iter()
            .map(|token| parse_float(token))
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| self.error("failed to parse float array", &tokens))
    }

    /// Read a float array and require exactly `N` values
    pub fn read_floats<const N: usize>(&mut self) -> Result<[f32; N]> {
        let values = self.read_float_array()?;
        <[f32; N]>::try_from(values.as_slice()).map_err(|_| {
            self.error(
                format!("expected {N} floats, found {}", values.len()),
                &[],
            )
        })
    }

    /// Scan forward for a line whose first word is `keyword`
    pub fn skip_to(&mut self, keyword: &str, max_lines: Option<usize>) -> bool {
        self.skip_to_any(&[keyword], max_lines)
    }

    /// Scan forward for a line whose first word is any of `keywords`.
    ///
    /// The scan starts at the current line and stops after `max_lines`
    /// lines when given. On a match the cursor is left on the matching line.
    pub fn skip_to_any(&mut self, keywords: &[&str], max_lines: Option<usize>) -> bool {
        let end = max_lines.map_or(self.lines.len(), |max| {
            self.lines.len().min(self.current + max)
        });

        for index in self.current..end {
            if let Some(first) = self.lines[index].split_whitespace().next()
                && keywords.contains(&first)
            {
                self.current = index;
                return true;
            }
        }
        false
    }

    pub fn skip_to_group_end(&mut self) -> bool {
        self.skip_to("}", None)
    }

    /// First word of the current line without consuming it
    pub fn peek_keyword(&self) -> Option<&'a str> {
        self.lines
            .get(self.current)
            .and_then(|line| line.split_whitespace().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    #[test_case("v 1 2 3", &["v", "1", "2", "3"] ; "plain words")]
    #[test_case("\ttexture: 0 \"my tex\"", &["texture:", "0", "my tex"] ; "double quotes")]
    #[test_case("a 'b c' d", &["a", "b c", "d"] ; "single quotes")]
    #[test_case("name \"\"", &["name", ""] ; "empty quoted token")]
    #[test_case("a\\ b", &["a b"] ; "escaped space")]
    #[test_case("   ", &[] ; "blank")]
    fn splits_like_a_shell(line: &str, expected: &[&str]) {
        let tokens = split_tokens(line).unwrap();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(split_tokens("texture: 0 \"broken").is_err());
    }

    #[test]
    fn reads_ints_and_floats_from_second_token() {
        let mut parser = TokenParser::new("verts: 12\nradius 2.5\n");
        assert_eq!(parser.read_int::<u32>().unwrap(), 12);
        assert_eq!(parser.read_float().unwrap(), 2.5);
        assert!(parser.is_eof());
    }

    #[test]
    fn nan_sentinels_parse_as_nan() {
        let mut parser = TokenParser::new("n -1.#QNAN0 1.#QNAN0 0.5");
        let values = parser.read_float_array().unwrap();
        assert!(values[0].is_nan());
        assert!(values[1].is_nan());
        assert_eq!(values[2], 0.5);
    }

    #[test]
    fn read_int_needs_two_tokens() {
        let mut parser = TokenParser::new("verts:\n");
        match parser.read_int::<u32>() {
            Err(DataError::Parse { line, tokens, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(tokens, vec!["verts:".to_owned()]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn skip_to_is_bounded_and_non_consuming() {
        let text = "a\nb\nc\nv 1 2 3\n";
        let mut parser = TokenParser::new(text);
        assert!(!parser.skip_to("v", Some(3)));
        assert_eq!(parser.tell(), 0);
        assert!(parser.skip_to("v", Some(4)));
        assert_eq!(parser.tell(), 3);
        assert!(parser.skip_to("v", None));
        assert_eq!(parser.tell(), 3);
        assert_eq!(parser.read_float_array().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn skip_to_matches_first_word_only() {
        let mut parser = TokenParser::new("verts: 3\nmtl v {\nv 0 0 0\n");
        assert!(parser.skip_to_any(&["v", "n"], None));
        assert_eq!(parser.tell(), 2);
    }

    #[test]
    fn seek_is_clamped() {
        let mut parser = TokenParser::new("a\nb\nc\n");
        assert_eq!(parser.seek(SeekFrom::End(0)), 3);
        assert_eq!(parser.seek(SeekFrom::Current(-10)), 0);
        assert_eq!(parser.seek(SeekFrom::Start(99)), 3);
        assert_eq!(parser.seek(SeekFrom::Start(1)), 1);
        assert_eq!(parser.seek(SeekFrom::Current(1)), 2);
    }

    #[test]
    fn reading_past_end_is_a_parse_error() {
        let mut parser = TokenParser::new("only\n");
        parser.read_line().unwrap();
        assert!(matches!(parser.read_tokens(), Err(DataError::Parse { .. })));
    }
}
