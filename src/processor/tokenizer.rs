use memchr::{memchr, memchr_iter};

const QUOTE: u8 = b'"';

/// Splits one delimited line into its field tokens.
///
/// A token may be wrapped in double quotes, in which case the delimiter is
/// literal inside it and `""` stands for one quote character. A stray quote
/// toggles quoted mode for the rest of the line; no error is raised for an
/// unterminated quote. The result always holds at least one token, so an
/// empty line yields `[""]`. Tokens are not trimmed.
pub fn split_line(line: &str, delimiter: char) -> Vec<String> {
    let mut tokens = Vec::new();
    split_line_into(line, delimiter, &mut tokens);
    tokens
}

/// Same as [`split_line`] but reuses `tokens` (cleared first).
pub fn split_line_into(line: &str, delimiter: char, tokens: &mut Vec<String>) {
    tokens.clear();

    if delimiter.is_ascii() && delimiter != '"' {
        let delim = delimiter as u8;
        // Lines without quotes are the common case: split on the delimiter directly.
        if memchr(QUOTE, line.as_bytes()).is_none() {
            let mut start = 0;
            for pos in memchr_iter(delim, line.as_bytes()) {
                tokens.push(line[start..pos].to_string());
                start = pos + 1;
            }
            tokens.push(line[start..].to_string());
            return;
        }
    }

    split_quoted(line, delimiter, tokens);
}

fn split_quoted(line: &str, delimiter: char, tokens: &mut Vec<String>) {
    let mut token = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                token.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == delimiter && !in_quotes {
            tokens.push(std::mem::take(&mut token));
        } else {
            token.push(c);
        }
    }
    tokens.push(token);
}
