//! Line-level CSV tokenizing and field quoting.
//!
//! Only comma-delimited, double-quote-escaped text is understood. Tokens come
//! back raw (quotes included); `normalize::clean_quoted` finishes them.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
    QuotedPendingEscape,
    // Closing quote seen, then whitespace; only a comma may follow.
    Closed,
}

/// Splits one line into raw field tokens. Commas inside a quoted field are
/// content. Malformed quoting falls back to a plain comma split.
pub fn tokenize_line(line: &str) -> Vec<String> {
    match tokenize_quoted(line) {
        Some(tokens) => tokens,
        None => naive_split(line),
    }
}

/// Quote-aware pass. `None` means the quoting could not be matched.
pub fn tokenize_quoted(line: &str) -> Option<Vec<String>> {
    let mut out: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut state = State::Unquoted;

    for ch in line.chars() {
        match state {
            State::Unquoted => match ch {
                ',' => out.push(std::mem::take(&mut buf)),
                '"' if buf.trim().is_empty() => {
                    buf.push(ch);
                    state = State::Quoted;
                }
                _ => buf.push(ch),
            },
            State::Quoted => {
                buf.push(ch);
                if ch == '"' {
                    state = State::QuotedPendingEscape;
                }
            }
            State::QuotedPendingEscape => match ch {
                '"' => {
                    buf.push(ch);
                    state = State::Quoted;
                }
                ',' => {
                    out.push(std::mem::take(&mut buf));
                    state = State::Unquoted;
                }
                c if c.is_whitespace() => {
                    buf.push(c);
                    state = State::Closed;
                }
                _ => return None,
            },
            State::Closed => match ch {
                ',' => {
                    out.push(std::mem::take(&mut buf));
                    state = State::Unquoted;
                }
                c if c.is_whitespace() => buf.push(c),
                _ => return None,
            },
        }
    }

    if state == State::Quoted {
        return None;
    }
    out.push(buf);
    Some(out)
}

pub fn naive_split(line: &str) -> Vec<String> {
    line.split(',').map(|s| s.to_string()).collect()
}

/// RFC-4180 quoting, applied only when the value needs it.
pub fn quote_field(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        quote_always(s)
    } else {
        s.to_string()
    }
}

pub fn quote_always(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}
