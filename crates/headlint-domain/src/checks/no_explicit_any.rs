use headlint_types::{Fix, RuleMessage};

use crate::check::{Check, Listener, Report, RuleContext, SourceView};
use crate::scan::Token;

/// Flags `any` written in a type position.
pub struct NoExplicitAny;

impl Check for NoExplicitAny {
    fn name(&self) -> &'static str {
        "no-explicit-any"
    }

    fn description(&self) -> &'static str {
        "Disallow the any type"
    }

    fn listeners(&self, _source: &SourceView<'_>) -> Box<dyn Listener> {
        Box::new(NoExplicitAnyListener)
    }
}

/// Tokens that put a directly following `any` in a type position.
const ANNOTATION: &[&str] = &[
    ":",
    "<",
    "|",
    "&",
    "as",
    "extends",
    "keyof",
    "satisfies",
];

/// Tokens that open a type context for everything up to the matching close.
const TYPE_OPENER: &[&str] = &["<", "as", "extends", "keyof", "satisfies", "implements"];

struct NoExplicitAnyListener;

impl NoExplicitAnyListener {
    fn in_type_position(cx: &RuleContext<'_>) -> bool {
        let mut before = cx.preceding().map(|t| cx.token_text(t));
        match before.next() {
            Some(prev) if ANNOTATION.contains(&prev) => true,
            // `(any)`, `[any]`, `Map<K, any>`
            Some(prev @ ("(" | "[" | ",")) => {
                inside_type_brackets(std::iter::once(prev).chain(before))
            }
            // `=> any`
            Some(">") => before.next() == Some("="),
            // `type Alias = any`
            Some("=") => is_type_alias(before),
            _ => false,
        }
    }
}

/// Walks outward from a `(`, `[` or `,` (nearest token first) and decides
/// whether the enclosing bracket belongs to a type.
fn inside_type_brackets<'t>(before: impl Iterator<Item = &'t str>) -> bool {
    let mut before = before.peekable();
    let mut depth = 0usize;
    // Passed a `:` that is either an annotation or a conditional branch.
    let mut colon = false;
    let mut last = "";
    while let Some(w) = before.next() {
        let after = std::mem::replace(&mut last, w);
        match w {
            ")" | "]" | "}" => depth += 1,
            "(" | "[" | "{" if depth > 0 => depth -= 1,
            _ if depth > 0 => {}
            // `a?: T` is an optional member, `a ? b : c` a conditional
            "?" if colon && after != ":" => colon = false,
            "?" => {}
            "(" | "[" | "{" | "," | ";" | "=" | "<" if colon => return true,
            ":" => colon = true,
            "(" | "[" => {
                // call arguments and element access: `f(any)`, `xs[any]`
                let value_before = before.peek().is_some_and(|p| {
                    matches!(*p, ")" | "]") || (is_word(p) && !TYPE_OPENER.contains(p))
                });
                if value_before {
                    return false;
                }
            }
            "{" | ";" => return false,
            "=" => return is_type_alias(before),
            w if TYPE_OPENER.contains(&w) => return true,
            _ => {}
        }
    }
    colon
}

/// `before` holds the tokens preceding an `=`, nearest first. True for
/// `type Name =` and `type Name<T> =`.
fn is_type_alias<'t>(mut before: impl Iterator<Item = &'t str>) -> bool {
    let mut name = before.next();
    if name == Some(">") {
        let mut depth = 1usize;
        for w in before.by_ref() {
            match w {
                ">" => depth += 1,
                "<" => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
        }
        if depth != 0 {
            return false;
        }
        name = before.next();
    }
    name.is_some_and(is_word) && before.next() == Some("type")
}

fn is_word(w: &str) -> bool {
    w.bytes()
        .next()
        .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_' || b == b'$' || b >= 0x80)
}

impl Listener for NoExplicitAnyListener {
    fn identifier(&mut self, cx: &mut RuleContext<'_>, token: Token) {
        if cx.token_text(token) != "any" {
            return;
        }
        // parameter or property named `any`
        if cx.followed_by(":") || cx.followed_by("?") {
            return;
        }
        if !Self::in_type_position(cx) {
            return;
        }

        cx.report(
            Report::new(
                token.range,
                RuleMessage::new("unexpectedAny", "Unexpected any. Specify a different type."),
            )
            .with_suggestion(
                RuleMessage::new(
                    "suggestUnknown",
                    "Use `unknown` instead, this will force you to explicitly, and safely assert the type is correct.",
                ),
                vec![Fix::replace(token.range, "unknown")],
            )
            .with_suggestion(
                RuleMessage::new(
                    "suggestNever",
                    "Use `never` instead, this is useful when instantiating generic type parameters that you don't need to know the type of.",
                ),
                vec![Fix::replace(token.range, "never")],
            ),
        );
    }
}
