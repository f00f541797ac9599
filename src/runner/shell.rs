//! POSIX shell quoting and argument splitting

/// Quote a string for a POSIX shell: wrap in single quotes and turn every
/// embedded `'` into `'\''`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(c);
        }
    }
    out.push('\'');
    out
}

/// Split a raw argument string into words.
///
/// Whitespace separates words; `'...'` is literal; inside `"..."` a backslash
/// only escapes `"`, `\`, `$` and `` ` ``; outside quotes a backslash escapes
/// the next character. An unterminated quote runs to the end of input.
pub fn split_args(raw: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                for c in chars.by_ref() {
                    if c == '\'' {
                        break;
                    }
                    current.push(c);
                }
            }
            '"' => {
                in_word = true;
                while let Some(c) = chars.next() {
                    match c {
                        '"' => break,
                        '\\' => match chars.peek() {
                            Some(&next @ ('"' | '\\' | '$' | '`')) => {
                                current.push(next);
                                chars.next();
                            }
                            _ => current.push('\\'),
                        },
                        _ => current.push(c),
                    }
                }
            }
            '\\' => {
                in_word = true;
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            _ => {
                in_word = true;
                current.push(c);
            }
        }
    }

    if in_word {
        words.push(current);
    }
    words
}

/// Split `raw` and quote every word, each prefixed with a space.
/// Empty input yields an empty string.
pub fn quoted_args(raw: &str) -> String {
    split_args(raw)
        .iter()
        .map(|w| format!(" {}", quote(w)))
        .collect()
}
