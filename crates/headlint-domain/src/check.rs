//! Listener-style check model.
//!
//! A [`Check`] is stateless and shared across workers. For every file it
//! hands out a fresh [`Listener`] which receives one call per token, in
//! source order, followed by [`Listener::end_of_file`].

use headlint_types::{Finding, Fix, RuleMessage, Suggestion, TextRange};

use crate::scan::{Token, TokenKind, tokenize};

/// One file as seen by checks: path, text and its token stream.
#[derive(Debug, Clone)]
pub struct SourceView<'a> {
    pub path: &'a str,
    pub text: &'a str,
    pub tokens: Vec<Token>,
}

impl<'a> SourceView<'a> {
    pub fn new(path: &'a str, text: &'a str) -> Self {
        Self {
            path,
            text,
            tokens: tokenize(text),
        }
    }
}

pub trait Check: Send + Sync {
    /// Name used in the stdin config and in the `rule` field of findings.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Per-file listener state.
    fn listeners(&self, source: &SourceView<'_>) -> Box<dyn Listener>;
}

/// Hook points. Every hook defaults to a no-op.
pub trait Listener {
    fn identifier(&mut self, _cx: &mut RuleContext<'_>, _token: Token) {}
    fn numeric_literal(&mut self, _cx: &mut RuleContext<'_>, _token: Token) {}
    fn string_literal(&mut self, _cx: &mut RuleContext<'_>, _token: Token) {}
    fn template_literal(&mut self, _cx: &mut RuleContext<'_>, _token: Token) {}
    fn regex_literal(&mut self, _cx: &mut RuleContext<'_>, _token: Token) {}
    fn comment(&mut self, _cx: &mut RuleContext<'_>, _token: Token) {}
    fn punctuation(&mut self, _cx: &mut RuleContext<'_>, _token: Token) {}
    fn end_of_file(&mut self, _cx: &mut RuleContext<'_>) {}
}

/// Route a token to the hook matching its kind.
pub fn dispatch(listener: &mut dyn Listener, cx: &mut RuleContext<'_>, token: Token) {
    match token.kind {
        TokenKind::Identifier => listener.identifier(cx, token),
        TokenKind::Number => listener.numeric_literal(cx, token),
        TokenKind::String => listener.string_literal(cx, token),
        TokenKind::Template => listener.template_literal(cx, token),
        TokenKind::Regex => listener.regex_literal(cx, token),
        TokenKind::Comment => listener.comment(cx, token),
        TokenKind::Punctuation => listener.punctuation(cx, token),
    }
}

/// A finding before it is tagged with its check name and file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub range: TextRange,
    pub message: RuleMessage,
    pub fixes: Vec<Fix>,
    pub suggestions: Vec<Suggestion>,
}

impl Report {
    pub fn new(range: TextRange, message: RuleMessage) -> Self {
        Self {
            range,
            message,
            fixes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_fix(mut self, fix: Fix) -> Self {
        self.fixes.push(fix);
        self
    }

    pub fn with_suggestion(mut self, message: RuleMessage, fixes: Vec<Fix>) -> Self {
        self.suggestions.push(Suggestion { message, fixes });
        self
    }
}

/// What a listener sees while handling one hook call.
pub struct RuleContext<'a> {
    source: &'a SourceView<'a>,
    rule: &'static str,
    index: usize,
    sink: &'a mut dyn FnMut(Finding),
}

impl<'a> RuleContext<'a> {
    /// `index` is the position of the current token; `tokens.len()` at end of file.
    pub fn new(
        source: &'a SourceView<'a>,
        rule: &'static str,
        index: usize,
        sink: &'a mut dyn FnMut(Finding),
    ) -> Self {
        Self {
            source,
            rule,
            index,
            sink,
        }
    }

    pub fn path(&self) -> &str {
        self.source.path
    }

    pub fn text(&self) -> &str {
        self.source.text
    }

    pub fn rule(&self) -> &'static str {
        self.rule
    }

    pub fn tokens(&self) -> &[Token] {
        &self.source.tokens
    }

    pub fn token_text(&self, token: Token) -> &str {
        token.text(self.source.text)
    }

    /// Significant tokens before the current one, nearest first.
    pub fn preceding(&self) -> impl Iterator<Item = Token> + '_ {
        let end = self.index.min(self.source.tokens.len());
        self.source.tokens[..end]
            .iter()
            .rev()
            .copied()
            .filter(|t| !t.is_trivia())
    }

    /// Significant tokens after the current one, nearest first.
    pub fn following(&self) -> impl Iterator<Item = Token> + '_ {
        let start = (self.index + 1).min(self.source.tokens.len());
        self.source.tokens[start..]
            .iter()
            .copied()
            .filter(|t| !t.is_trivia())
    }

    pub fn prev_significant(&self) -> Option<Token> {
        self.preceding().next()
    }

    pub fn next_significant(&self) -> Option<Token> {
        self.following().next()
    }

    /// True when the previous significant token's text is `text`.
    pub fn preceded_by(&self, text: &str) -> bool {
        self.prev_significant()
            .is_some_and(|t| self.token_text(t) == text)
    }

    pub fn followed_by(&self, text: &str) -> bool {
        self.next_significant()
            .is_some_and(|t| self.token_text(t) == text)
    }

    pub fn report(&mut self, report: Report) {
        let finding = Finding {
            range: report.range,
            rule: self.rule.to_string(),
            message: report.message,
            fixes: report.fixes,
            suggestions: report.suggestions,
            file_path: self.source.path.to_string(),
        };
        (self.sink)(finding);
    }
}
