//! Placeholder translation
//!
//! Statements are written with the portable `?` marker. PostgreSQL wants
//! numbered `$n` parameters, so every `?` outside a quoted literal, a quoted
//! identifier or a comment is rewritten in order. `??` stands for a literal
//! `?`, which keeps jsonb operators such as `??|` expressible.

use crate::errors::ExecutionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lexeme {
    Code,
    Literal,
    /// `E'...'` literal, where a backslash escapes the next character
    EscapeLiteral,
    Identifier,
    LineComment,
    /// Nesting depth of `/* */`
    BlockComment(usize),
}

/// Rewrite `?` markers to `$1..$n`, returning the new text and `n`
pub fn translate(sql: &str) -> (String, usize) {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0;
    let mut state = Lexeme::Code;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            Lexeme::Code => match c {
                '\'' if is_escape_prefix(&out) => state = Lexeme::EscapeLiteral,
                '\'' => state = Lexeme::Literal,
                '"' => state = Lexeme::Identifier,
                '-' if chars.peek() == Some(&'-') => {
                    chars.next();
                    out.push_str("--");
                    state = Lexeme::LineComment;
                    continue;
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    out.push_str("/*");
                    state = Lexeme::BlockComment(1);
                    continue;
                }
                '?' if chars.peek() == Some(&'?') => {
                    chars.next();
                    out.push('?');
                    continue;
                }
                '?' => {
                    count += 1;
                    out.push('$');
                    out.push_str(&count.to_string());
                    continue;
                }
                _ => {}
            },
            Lexeme::Literal | Lexeme::EscapeLiteral if c == '\'' => {
                out.push(c);
                // a doubled quote stays inside the literal
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push('\'');
                } else {
                    state = Lexeme::Code;
                }
                continue;
            }
            Lexeme::Identifier if c == '"' => state = Lexeme::Code,
            Lexeme::EscapeLiteral if c == '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            Lexeme::LineComment if c == '\n' => state = Lexeme::Code,
            Lexeme::BlockComment(depth) => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("*/");
                    state = if depth == 1 {
                        Lexeme::Code
                    } else {
                        Lexeme::BlockComment(depth - 1)
                    };
                    continue;
                }
                if c == '/' && chars.peek() == Some(&'*') {
                    chars.next();
                    out.push_str("/*");
                    state = Lexeme::BlockComment(depth + 1);
                    continue;
                }
            }
            _ => {}
        }
        out.push(c);
    }

    (out, count)
}

/// True when the `'` about to open follows a standalone `E` or `e`
fn is_escape_prefix(out: &str) -> bool {
    let mut tail = out.chars().rev();
    matches!(tail.next(), Some('E' | 'e'))
        && !tail
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
}

/// Translate and check that the argument count matches the markers
pub(crate) fn prepare(sql: &str, supplied: usize) -> Result<String, ExecutionError> {
    let (translated, expected) = translate(sql);
    if expected != supplied {
        return Err(ExecutionError::ArgumentCount {
            expected,
            actual: supplied,
        });
    }
    Ok(translated)
}
