use headlint_types::{Fix, RuleMessage, TextRange};

use crate::check::{Check, Listener, Report, RuleContext, SourceView};
use crate::scan::Token;

/// Flags `@ts-ignore` and `@ts-nocheck` directive comments.
pub struct BanTsComment;

impl Check for BanTsComment {
    fn name(&self) -> &'static str {
        "ban-ts-comment"
    }

    fn description(&self) -> &'static str {
        "Disallow @ts-<directive> comments"
    }

    fn listeners(&self, _source: &SourceView<'_>) -> Box<dyn Listener> {
        Box::new(BanTsCommentListener)
    }
}

const TS_IGNORE: &str = "@ts-ignore";
const TS_NOCHECK: &str = "@ts-nocheck";
const TS_EXPECT_ERROR: &str = "@ts-expect-error";

/// Byte offset of a directive at the start of a comment's body, if any.
fn find_directive(comment: &str, directive: &str) -> Option<usize> {
    let body_start = if comment.starts_with("//") || comment.starts_with("/*") {
        2
    } else {
        return None;
    };
    let body = &comment[body_start..];
    let trimmed = body.trim_start_matches(|c: char| c.is_whitespace() || c == '*');
    let rest = trimmed.strip_prefix(directive)?;
    let boundary = rest
        .chars()
        .next()
        .is_none_or(|c| !(c.is_alphanumeric() || c == '-' || c == '_'));
    if !boundary {
        return None;
    }
    Some(body_start + (body.len() - trimmed.len()))
}

struct BanTsCommentListener;

impl Listener for BanTsCommentListener {
    fn comment(&mut self, cx: &mut RuleContext<'_>, token: Token) {
        let text = cx.token_text(token);

        if let Some(offset) = find_directive(text, TS_IGNORE) {
            let start = token.range.pos + offset;
            let directive = TextRange::new(start, start + TS_IGNORE.len());
            cx.report(
                Report::new(
                    token.range,
                    RuleMessage::new(
                        "tsIgnoreInsteadOfExpectError",
                        "Use \"@ts-expect-error\" instead of \"@ts-ignore\", as \"@ts-ignore\" will do nothing if the following line is error-free.",
                    ),
                )
                .with_suggestion(
                    RuleMessage::new(
                        "replaceTsIgnoreWithTsExpectError",
                        "Replace \"@ts-ignore\" with \"@ts-expect-error\".",
                    ),
                    vec![Fix::replace(directive, TS_EXPECT_ERROR)],
                ),
            );
            return;
        }

        if find_directive(text, TS_NOCHECK).is_some() {
            cx.report(Report::new(
                token.range,
                RuleMessage::new(
                    "tsDirectiveComment",
                    "Do not use \"@ts-nocheck\" because it alters compilation errors.",
                ),
            ));
        }
    }
}
