//! Token scanner for TypeScript / JavaScript source text.
//!
//! The scanner is deliberately shallow: it classifies spans as identifiers,
//! literals, comments and punctuation so that checks can attach listeners to
//! them. It never fails; malformed input (an unterminated string, a stray
//! byte) still produces a token stream that covers the text in order.
//!
//! Token boundaries always fall on ASCII bytes or at the end of the text, so
//! every token range can be used to slice the source `&str`.

use std::fmt;

use headlint_types::TextRange;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifiers and keywords (`debugger`, `var`, `any`, `foo`).
    Identifier,
    Number,
    /// `'...'` or `"..."`.
    String,
    /// `` `...` ``, including any `${}` substitutions.
    Template,
    Regex,
    /// `// ...` or `/* ... */`.
    Comment,
    /// A single ASCII punctuation byte.
    Punctuation,
}

impl fmt::Debug for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Identifier => "Identifier",
            TokenKind::Number => "Number",
            TokenKind::String => "String",
            TokenKind::Template => "Template",
            TokenKind::Regex => "Regex",
            TokenKind::Comment => "Comment",
            TokenKind::Punctuation => "Punctuation",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
}

impl Token {
    pub fn new(kind: TokenKind, pos: usize, end: usize) -> Self {
        Self {
            kind,
            range: TextRange::new(pos, end),
        }
    }

    /// Slice of `source` covered by this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        source.get(self.range.pos..self.range.end).unwrap_or("")
    }

    /// Comments are trivia: checks looking at neighbours skip them.
    pub fn is_trivia(&self) -> bool {
        self.kind == TokenKind::Comment
    }
}

/// Tokenize a whole file.
pub fn tokenize(text: &str) -> Vec<Token> {
    Scanner::new(text).collect()
}

/// Keywords after which a `/` starts a regular expression rather than a division.
const REGEX_PRECEDING_KEYWORDS: &[&str] = &[
    "return",
    "typeof",
    "instanceof",
    "case",
    "do",
    "else",
    "in",
    "of",
    "new",
    "delete",
    "void",
    "throw",
    "yield",
    "await",
];

/// Streaming tokenizer over one file's text.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    /// Last three significant tokens, most recent first.
    recent: [Option<Token>; 3],
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            recent: [None; 3],
        }
    }

    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek(0) {
            if !b.is_ascii_whitespace() {
                break;
            }
            self.pos += 1;
        }
    }

    fn scan_line_comment(&mut self, start: usize) -> Token {
        let end = find_byte(self.bytes, start, b'\n').unwrap_or(self.bytes.len());
        self.pos = end;
        Token::new(TokenKind::Comment, start, end)
    }

    fn scan_block_comment(&mut self, start: usize) -> Token {
        let mut i = start + 2;
        let len = self.bytes.len();
        let mut end = len;
        while i + 1 < len {
            if self.bytes[i] == b'*' && self.bytes[i + 1] == b'/' {
                end = i + 2;
                break;
            }
            i += 1;
        }
        self.pos = end;
        Token::new(TokenKind::Comment, start, end)
    }

    /// Quoted string. An unescaped newline terminates an unterminated literal.
    fn scan_string(&mut self, start: usize, quote: u8) -> Token {
        let len = self.bytes.len();
        let mut i = start + 1;
        let mut end = len;
        while i < len {
            match self.bytes[i] {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'\n' => {
                    end = i;
                    break;
                }
                b if b == quote => {
                    end = i + 1;
                    break;
                }
                _ => i += 1,
            }
        }
        let end = end.min(len);
        self.pos = end;
        Token::new(TokenKind::String, start, end)
    }

    /// Template literal. Substitutions are tracked only to find the closing
    /// backtick; their contents stay part of the template token.
    fn scan_template(&mut self, start: usize) -> Token {
        let len = self.bytes.len();
        let mut i = start + 1;
        let mut depth = 0u32;
        let mut end = len;
        while i < len {
            match self.bytes[i] {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'$' if depth == 0 && self.bytes.get(i + 1) == Some(&b'{') => {
                    depth = 1;
                    i += 2;
                    continue;
                }
                b'{' if depth > 0 => depth += 1,
                b'}' if depth > 0 => depth -= 1,
                b'`' if depth == 0 => {
                    end = i + 1;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        let end = end.min(len);
        self.pos = end;
        Token::new(TokenKind::Template, start, end)
    }

    /// Regular expression literal, or `None` when no closing `/` exists on
    /// the line (the `/` is then plain punctuation).
    fn scan_regex(&mut self, start: usize) -> Option<Token> {
        let len = self.bytes.len();
        let mut i = start + 1;
        let mut in_class = false;
        while i < len {
            match self.bytes[i] {
                b'\\' => {
                    i += 2;
                    continue;
                }
                b'\n' => return None,
                b'[' => in_class = true,
                b']' => in_class = false,
                b'/' if !in_class => {
                    i += 1;
                    while i < len && is_ident_continue(self.bytes[i]) {
                        i += 1;
                    }
                    self.pos = i;
                    return Some(Token::new(TokenKind::Regex, start, i));
                }
                _ => {}
            }
            i += 1;
        }
        None
    }

    fn scan_number(&mut self, start: usize) -> Token {
        let mut i = start + 1;
        while i < self.bytes.len() {
            let b = self.bytes[i];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                i += 1;
            } else {
                break;
            }
        }
        self.pos = i;
        Token::new(TokenKind::Number, start, i)
    }

    fn scan_identifier(&mut self, start: usize) -> Token {
        let mut i = start + 1;
        while i < self.bytes.len() && is_ident_continue(self.bytes[i]) {
            i += 1;
        }
        self.pos = i;
        Token::new(TokenKind::Identifier, start, i)
    }

    fn regex_allowed(&self) -> bool {
        let Some(prev) = self.recent[0] else {
            return true;
        };
        let text = prev.text(self.text);
        match prev.kind {
            TokenKind::Punctuation => {
                !matches!(text, ")" | "]" | "}") && !self.after_postfix_update()
            }
            TokenKind::Identifier => REGEX_PRECEDING_KEYWORDS.contains(&text),
            _ => false,
        }
    }

    /// `x++` / `x--`: the operator ends an operand, so `/` divides.
    fn after_postfix_update(&self) -> bool {
        let [Some(second), Some(first), Some(operand)] = self.recent else {
            return false;
        };
        let op = second.text(self.text);
        if !matches!(op, "+" | "-")
            || first.text(self.text) != op
            || first.range.end != second.range.pos
        {
            return false;
        }
        match operand.kind {
            TokenKind::Identifier => !REGEX_PRECEDING_KEYWORDS.contains(&operand.text(self.text)),
            TokenKind::Punctuation => matches!(operand.text(self.text), ")" | "]"),
            _ => false,
        }
    }

    fn scan_token(&mut self) -> Option<Token> {
        self.skip_whitespace();
        let start = self.pos;
        let b = self.peek(0)?;

        let token = match b {
            b'/' if self.peek(1) == Some(b'/') => self.scan_line_comment(start),
            b'/' if self.peek(1) == Some(b'*') => self.scan_block_comment(start),
            b'/' if self.regex_allowed() => match self.scan_regex(start) {
                Some(token) => token,
                None => self.punctuation(start),
            },
            b'"' | b'\'' => self.scan_string(start, b),
            b'`' => self.scan_template(start),
            b'0'..=b'9' => self.scan_number(start),
            b'.' if self.peek(1).is_some_and(|n| n.is_ascii_digit()) => self.scan_number(start),
            b if is_ident_start(b) => self.scan_identifier(start),
            _ => self.punctuation(start),
        };

        Some(token)
    }

    fn punctuation(&mut self, start: usize) -> Token {
        self.pos = start + 1;
        Token::new(TokenKind::Punctuation, start, start + 1)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let token = self.scan_token()?;
        if !token.is_trivia() {
            self.recent = [Some(token), self.recent[0], self.recent[1]];
        }
        Some(token)
    }
}

/// Non-ASCII bytes are treated as identifier characters so that tokens never
/// split a multi-byte character.
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes[from..].iter().position(|&b| b == needle).map(|i| from + i)
}
