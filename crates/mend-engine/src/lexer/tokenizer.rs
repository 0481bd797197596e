//! A small Python tokenizer.
//!
//! Produces just enough of the standard token stream for logical-statement
//! extraction: names, numbers, strings (including triple-quoted ones that
//! span lines), operators, comments, and the Newline/Nl distinction driven
//! by bracket depth and backslash continuation.

use super::token::{Token, TokenKind};

/// Operators and delimiters, longest first so multi-character operators win.
const OPERATORS: &[&str] = &[
    "**=", "//=", ">>=", "<<=", "...", "!=", ">=", "<=", "==", "->", "+=", "-=", "*=", "/=",
    "%=", "&=", "|=", "^=", ":=", "**", "//", ">>", "<<", "+", "-", "*", "/", "%", "@", "&",
    "|", "^", "~", "<", ">", "(", ")", "[", "]", "{", "}", ",", ":", ".", ";", "=",
];

/// Tokenize source text. The scan is line-oriented; it never fails, leaving
/// genuinely malformed text to the parser to reject.
pub fn tokenize(source: &str) -> Vec<Token> {
    Tokenizer::new(source).run()
}

struct Tokenizer<'a> {
    lines: Vec<&'a str>,
    tokens: Vec<Token>,
    depth: usize,
    /// A statement-significant token was seen since the last logical newline.
    pending_statement: bool,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().collect(),
            tokens: Vec::new(),
            depth: 0,
            pending_statement: false,
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut row = 0usize;
        while row < self.lines.len() {
            row = self.scan_line(row);
        }
        let last = self.lines.len() as u32;
        self.tokens
            .push(Token::new(TokenKind::EndMarker, "", last.max(1), last.max(1)));
        self.tokens
    }

    /// Scan one physical line; returns the next row to scan (triple-quoted
    /// strings may consume several rows).
    fn scan_line(&mut self, row: usize) -> usize {
        let line = self.lines[row];
        let lineno = row as u32 + 1;
        let bytes = line.as_bytes();
        let mut col = 0usize;
        let mut continuation = false;
        let mut next_row = row + 1;

        while col < bytes.len() {
            let c = bytes[col] as char;
            if c == ' ' || c == '\t' {
                col += 1;
                continue;
            }
            if c == '#' {
                self.tokens.push(Token::new(
                    TokenKind::Comment,
                    &line[col..],
                    lineno,
                    lineno,
                ));
                break;
            }
            if c == '\\' && col + 1 == bytes.len() {
                continuation = true;
                col += 1;
                break;
            }
            if is_string_start(line, col) {
                let (token, end_row, end_col) = self.scan_string(row, col);
                next_row = end_row + 1;
                self.tokens.push(token);
                self.pending_statement = true;
                if end_row != row {
                    // The string consumed following rows; resume after it.
                    return self.resume_after_string(end_row, end_col);
                }
                col = end_col;
                continue;
            }
            if c.is_ascii_digit() || (c == '.' && bytes.get(col + 1).is_some_and(|b| b.is_ascii_digit())) {
                let end = scan_number(line, col);
                self.tokens.push(Token::new(
                    TokenKind::Number,
                    &line[col..end],
                    lineno,
                    lineno,
                ));
                self.pending_statement = true;
                col = end;
                continue;
            }
            if c.is_alphanumeric() || c == '_' {
                let end = scan_name(line, col);
                self.tokens
                    .push(Token::new(TokenKind::Name, &line[col..end], lineno, lineno));
                self.pending_statement = true;
                col = end;
                continue;
            }
            if let Some(op) = scan_operator(line, col) {
                match op {
                    "(" | "[" | "{" => self.depth += 1,
                    ")" | "]" | "}" => self.depth = self.depth.saturating_sub(1),
                    _ => {}
                }
                self.tokens
                    .push(Token::new(TokenKind::Op, op, lineno, lineno));
                self.pending_statement = true;
                col += op.len();
                continue;
            }
            // Unknown character: skip it, the parser will complain later.
            col += 1;
        }

        self.emit_newline(lineno, continuation);
        next_row
    }

    /// Continue scanning the tail of `end_row` after a multi-line string.
    fn resume_after_string(&mut self, end_row: usize, end_col: usize) -> usize {
        let line = self.lines[end_row];
        let lineno = end_row as u32 + 1;
        let rest = &line[end_col.min(line.len())..];
        // Re-scan the remainder as a fresh pseudo-line to keep this simple:
        // tokens after a closing triple quote on the same line.
        let mut sub = Tokenizer {
            lines: vec![rest],
            tokens: Vec::new(),
            depth: self.depth,
            pending_statement: self.pending_statement,
        };
        sub.scan_line(0);
        self.depth = sub.depth;
        for mut token in sub.tokens {
            if token.kind == TokenKind::EndMarker {
                continue;
            }
            token.start_line = lineno;
            token.end_line = lineno;
            self.tokens.push(token);
        }
        // scan_line emitted the newline for this physical line already.
        if let Some(last) = self.tokens.last() {
            if matches!(last.kind, TokenKind::Newline | TokenKind::Nl) {
                self.pending_statement = false;
            }
        }
        end_row + 1
    }

    fn emit_newline(&mut self, lineno: u32, continuation: bool) {
        let kind = if continuation || self.depth > 0 || !self.pending_statement {
            TokenKind::Nl
        } else {
            TokenKind::Newline
        };
        if kind == TokenKind::Newline {
            self.pending_statement = false;
        }
        self.tokens.push(Token::new(kind, "", lineno, lineno));
    }

    /// Scan a string literal starting at (row, col). Returns the token and
    /// the row/column just past the closing quote.
    fn scan_string(&mut self, row: usize, col: usize) -> (Token, usize, usize) {
        let line = self.lines[row];
        let start_line = row as u32 + 1;
        let mut idx = col;
        // Skip prefix letters (r, b, f, u in any case).
        while idx < line.len() {
            let c = line.as_bytes()[idx] as char;
            if matches!(c, 'r' | 'R' | 'b' | 'B' | 'f' | 'F' | 'u' | 'U') {
                idx += 1;
            } else {
                break;
            }
        }
        let quote = line.as_bytes()[idx] as char;
        let triple = line[idx..].starts_with(&quote.to_string().repeat(3));
        let quote_len = if triple { 3 } else { 1 };
        let body_start = idx + quote_len;

        if !triple {
            // Single-quoted strings end on the same line.
            let mut i = body_start;
            let bytes = line.as_bytes();
            while i < bytes.len() {
                let c = bytes[i] as char;
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if c == quote {
                    break;
                }
                i += 1;
            }
            let end = (i + 1).min(line.len());
            let token = Token::new(TokenKind::Str, &line[col..end], start_line, start_line);
            return (token, row, end);
        }

        let closer = quote.to_string().repeat(3);
        if let Some(pos) = line[body_start..].find(&closer) {
            let end = body_start + pos + 3;
            let token = Token::new(TokenKind::Str, &line[col..end], start_line, start_line);
            return (token, row, end);
        }
        // Spans multiple physical lines.
        let mut text = String::from(&line[col..]);
        let mut current = row + 1;
        while current < self.lines.len() {
            text.push('\n');
            let candidate = self.lines[current];
            if let Some(pos) = candidate.find(&closer) {
                let end = pos + 3;
                text.push_str(&candidate[..end]);
                let token = Token::new(TokenKind::Str, text, start_line, current as u32 + 1);
                return (token, current, end);
            }
            text.push_str(candidate);
            current += 1;
        }
        let last_row = self.lines.len().saturating_sub(1);
        let token = Token::new(TokenKind::Str, text, start_line, last_row as u32 + 1);
        (token, last_row, self.lines[last_row].len())
    }
}

fn is_string_start(line: &str, col: usize) -> bool {
    let bytes = line.as_bytes();
    let mut idx = col;
    while idx < bytes.len() {
        match bytes[idx] as char {
            'r' | 'R' | 'b' | 'B' | 'f' | 'F' | 'u' | 'U' if idx - col < 2 => idx += 1,
            '"' | '\'' => return true,
            _ => return false,
        }
    }
    false
}

fn scan_number(line: &str, col: usize) -> usize {
    let bytes = line.as_bytes();
    let mut idx = col;
    while idx < bytes.len() {
        let c = bytes[idx] as char;
        if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
            idx += 1;
        } else if (c == '+' || c == '-')
            && idx > col
            && matches!(bytes[idx - 1] as char, 'e' | 'E')
        {
            idx += 1;
        } else {
            break;
        }
    }
    idx
}

fn scan_name(line: &str, col: usize) -> usize {
    line[col..]
        .char_indices()
        .find(|(_, c)| !(c.is_alphanumeric() || *c == '_'))
        .map(|(i, _)| col + i)
        .unwrap_or(line.len())
}

fn scan_operator(line: &str, col: usize) -> Option<&'static str> {
    OPERATORS
        .iter()
        .find(|op| line[col..].starts_with(**op))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn simple_statement_ends_with_logical_newline() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = 1\n"),
            vec![Name, Op, Number, Newline, EndMarker]
        );
    }

    #[test]
    fn newline_inside_brackets_is_nl() {
        use TokenKind::*;
        assert_eq!(
            kinds("x = (1 +\n     2)\n"),
            vec![Name, Op, Op, Number, Op, Nl, Number, Op, Newline, EndMarker]
        );
    }

    #[test]
    fn blank_and_comment_lines_are_nl() {
        use TokenKind::*;
        assert_eq!(kinds("\n# note\n"), vec![Nl, Comment, Nl, EndMarker]);
    }

    #[test]
    fn backslash_continuation_joins_lines() {
        use TokenKind::*;
        assert_eq!(
            kinds("total = 1 + \\\n    2\n"),
            vec![Name, Op, Number, Op, Nl, Number, Newline, EndMarker]
        );
    }

    #[test]
    fn triple_quoted_strings_span_lines() {
        let tokens = tokenize("s = '''a\nb'''\n");
        let string = tokens.iter().find(|t| t.kind == TokenKind::Str).unwrap();
        assert_eq!(string.start_line, 1);
        assert_eq!(string.end_line, 2);
    }
}
