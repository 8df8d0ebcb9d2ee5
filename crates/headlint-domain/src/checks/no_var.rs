use std::collections::HashMap;

use headlint_types::{Fix, RuleMessage};

use crate::check::{Check, Listener, Report, RuleContext, SourceView};
use crate::scan::{Token, TokenKind};

/// Flags `var` declarations. The `let` rewrite is only attached when block
/// scoping cannot change what the code does.
pub struct NoVar;

impl Check for NoVar {
    fn name(&self) -> &'static str {
        "no-var"
    }

    fn description(&self) -> &'static str {
        "Require let or const instead of var"
    }

    fn listeners(&self, source: &SourceView<'_>) -> Box<dyn Listener> {
        let significant: Vec<Token> = source
            .tokens
            .iter()
            .copied()
            .filter(|t| !t.is_trivia())
            .collect();
        let declarations = count_declarations(&significant, source.text);
        Box::new(NoVarListener {
            significant,
            declarations,
        })
    }
}

/// Tokens after which `var` starts a declaration.
const STATEMENT_START: &[&str] = &[";", "{", "}", "(", ":", "export", "declare"];

struct NoVarListener {
    significant: Vec<Token>,
    /// How often each name is declared anywhere in the file.
    declarations: HashMap<String, usize>,
}

impl NoVarListener {
    fn fix_is_safe(&self, text: &str, at: usize) -> bool {
        let tokens = &self.significant;
        let Some(names) = declared_names(tokens, text, at) else {
            // destructuring
            return false;
        };
        if names
            .iter()
            .any(|name| self.declarations.get(*name).copied().unwrap_or(0) > 1)
        {
            return false;
        }
        if in_loop_or_switch(tokens, text, at) {
            return false;
        }

        let (start, end) = let_scope(tokens, text, at);
        let for_header = word(tokens, text, start) == "for";
        if for_header && contains_function(&tokens[start..end], text) {
            // closures would capture a fresh binding per iteration
            return false;
        }

        // Used before the declaration or outside the block `let` would
        // scope it to.
        !tokens.iter().enumerate().any(|(j, t)| {
            (j < at || j >= end)
                && t.kind == TokenKind::Identifier
                && names.contains(&t.text(text))
                && (j == 0 || word(tokens, text, j - 1) != ".")
        })
    }
}

impl Listener for NoVarListener {
    fn identifier(&mut self, cx: &mut RuleContext<'_>, token: Token) {
        if cx.token_text(token) != "var" {
            return;
        }
        let at_statement_start = match cx.prev_significant() {
            None => true,
            Some(prev) => STATEMENT_START.contains(&cx.token_text(prev)),
        };
        if !at_statement_start || cx.followed_by(":") {
            return;
        }

        let safe = self
            .significant
            .binary_search_by_key(&token.range.pos, |t| t.range.pos)
            .is_ok_and(|at| self.fix_is_safe(cx.text(), at));

        let mut report = Report::new(
            token.range,
            RuleMessage::new("unexpectedVar", "Unexpected var, use let or const instead."),
        );
        if safe {
            report = report.with_fix(Fix::replace(token.range, "let"));
        }
        cx.report(report);
    }
}

fn word<'t>(tokens: &[Token], text: &'t str, i: usize) -> &'t str {
    tokens.get(i).map_or("", |t| t.text(text))
}

/// Binding names introduced by the declaration keyword at `at`, or `None`
/// for a destructuring pattern.
fn declared_names<'t>(tokens: &[Token], text: &'t str, at: usize) -> Option<Vec<&'t str>> {
    let mut names = Vec::new();
    let mut depth = 0usize;
    let mut expect_name = true;
    for token in tokens.iter().skip(at + 1) {
        let w = token.text(text);
        if expect_name {
            if token.kind != TokenKind::Identifier {
                return None;
            }
            names.push(w);
            expect_name = false;
            continue;
        }
        match w {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" if depth == 0 => break,
            ")" | "]" | "}" => depth -= 1,
            ";" | "in" | "of" | "var" | "let" | "const" if depth == 0 => break,
            "," if depth == 0 => expect_name = true,
            _ => {}
        }
    }
    (!names.is_empty()).then_some(names)
}

fn count_declarations(tokens: &[Token], text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for (i, token) in tokens.iter().enumerate() {
        let names = match token.text(text) {
            "var" | "let" | "const" => declared_names(tokens, text, i).unwrap_or_default(),
            "function" | "class" => tokens
                .get(i + 1)
                .filter(|t| t.kind == TokenKind::Identifier)
                .map(|t| vec![t.text(text)])
                .unwrap_or_default(),
            _ => continue,
        };
        for name in names {
            *counts.entry(name.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Index of the token closing the bracket opened at `open`.
fn matching(tokens: &[Token], text: &str, open: usize, o: &str, c: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        let w = token.text(text);
        if w == o {
            depth += 1;
        } else if w == c {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Index of the token opening the bracket closed at `close`.
fn matching_back(tokens: &[Token], text: &str, close: usize, o: &str, c: &str) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..=close.min(tokens.len().saturating_sub(1))).rev() {
        let w = word(tokens, text, i);
        if w == c {
            depth += 1;
        } else if w == o {
            depth = depth.saturating_sub(1);
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// The innermost unclosed `{` before `at`.
fn enclosing_block(tokens: &[Token], text: &str, at: usize) -> Option<usize> {
    let mut depth = 0usize;
    for i in (0..at).rev() {
        match word(tokens, text, i) {
            "}" => depth += 1,
            "{" if depth == 0 => return Some(i),
            "{" => depth -= 1,
            _ => {}
        }
    }
    None
}

fn in_loop_or_switch(tokens: &[Token], text: &str, mut at: usize) -> bool {
    while let Some(open) = enclosing_block(tokens, text, at) {
        let head = match word(tokens, text, open.wrapping_sub(1)) {
            "do" => true,
            ")" => matching_back(tokens, text, open - 1, "(", ")").is_some_and(|paren| {
                matches!(
                    word(tokens, text, paren.wrapping_sub(1)),
                    "for" | "while" | "switch"
                )
            }),
            _ => false,
        };
        if head {
            return true;
        }
        at = open;
    }
    false
}

/// Token range `[start, end)` that a `let` in place of the `var` at `at`
/// would be scoped to.
fn let_scope(tokens: &[Token], text: &str, at: usize) -> (usize, usize) {
    if at >= 2 && word(tokens, text, at - 1) == "(" && word(tokens, text, at - 2) == "for" {
        let end = matching(tokens, text, at - 1, "(", ")")
            .map_or(tokens.len(), |close| statement_end(tokens, text, close + 1));
        return (at - 2, end);
    }
    match enclosing_block(tokens, text, at) {
        Some(open) => (
            open,
            matching(tokens, text, open, "{", "}").map_or(tokens.len(), |close| close + 1),
        ),
        None => (0, tokens.len()),
    }
}

/// End (exclusive) of the statement starting at `from`.
fn statement_end(tokens: &[Token], text: &str, from: usize) -> usize {
    if word(tokens, text, from) == "{" {
        return matching(tokens, text, from, "{", "}").map_or(tokens.len(), |close| close + 1);
    }
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(from) {
        match token.text(text) {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" if depth == 0 => return i,
            ")" | "]" | "}" => depth -= 1,
            ";" if depth == 0 => return i + 1,
            _ => {}
        }
    }
    tokens.len()
}

/// `function` or an arrow `=>`.
fn contains_function(tokens: &[Token], text: &str) -> bool {
    tokens.iter().enumerate().any(|(i, t)| match t.text(text) {
        "function" => true,
        "=" => tokens
            .get(i + 1)
            .is_some_and(|next| next.text(text) == ">" && next.range.pos == t.range.end),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::{apply, lint_one};

    fn fixed(src: &str) -> String {
        let fixes: Vec<_> = lint_one(NoVar, src)
            .into_iter()
            .flat_map(|f| f.fixes)
            .collect();
        apply(src, &fixes)
    }

    #[test]
    fn rewrites_declarations() {
        let src = "var a = 1;\nfor (var i = 0; i < 1; i++) {}\nexport var b;";
        let out = lint_one(NoVar, src);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|f| f.message.id == "unexpectedVar"));

        let fixes: Vec<_> = out.iter().flat_map(|f| f.fixes.clone()).collect();
        assert_eq!(
            apply(src, &fixes),
            "let a = 1;\nfor (let i = 0; i < 1; i++) {}\nexport let b;"
        );
    }

    #[test]
    fn rewrites_inside_function_body() {
        assert_eq!(
            fixed("function f() { var a = 1, b; return a + b; }"),
            "function f() { let a = 1, b; return a + b; }"
        );
    }

    #[test]
    fn redeclared_and_escaping_names_are_not_fixed() {
        let src = "var a = 1;\nvar a = 2;\nif (c) { var b = 1 }\nuse(b);";
        let out = lint_one(NoVar, src);
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|f| f.fixes.is_empty()));
    }

    #[test]
    fn unsafe_positions_are_reported_without_fix() {
        for src in [
            // read before the declaration
            "use(a); var a = 1;",
            // shadows a parameter
            "function f(a) { var a = 1; }",
            // redeclared by a later declarator
            "var a; let b, a;",
            // loop closure
            "for (var i = 0; i < n; i++) { fns.push(() => i); }",
            // loop body persists across iterations
            "while (x) { var y; if (c) y = 1; }",
            "do { var y; } while (x);",
            // switch cases share one block
            "switch (x) { case 1: var a = 1; break; case 2: a = 2; }",
            // destructuring
            "var { a } = o;",
        ] {
            let out = lint_one(NoVar, src);
            assert!(!out.is_empty(), "{src}");
            let var_at = src.find("var").unwrap_or_default();
            let finding = out.iter().find(|f| f.range.pos == var_at).expect(src);
            assert!(finding.fixes.is_empty(), "{src}");
        }
    }

    #[test]
    fn member_access_is_not_a_reference() {
        assert_eq!(
            fixed("{ var n = 1; }\no.n = 2;"),
            "{ let n = 1; }\no.n = 2;"
        );
    }

    #[test]
    fn ignores_non_declarations() {
        let src = "({ var: 1 }); o.var; let variable; // var x\n\"var\";";
        assert!(lint_one(NoVar, src).is_empty());
    }
}
