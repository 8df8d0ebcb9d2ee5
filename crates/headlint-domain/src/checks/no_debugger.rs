use headlint_types::{Fix, RuleMessage};

use crate::check::{Check, Listener, Report, RuleContext, SourceView};
use crate::scan::Token;

/// Flags `debugger` statements.
pub struct NoDebugger;

impl Check for NoDebugger {
    fn name(&self) -> &'static str {
        "no-debugger"
    }

    fn description(&self) -> &'static str {
        "Disallow the use of debugger"
    }

    fn listeners(&self, _source: &SourceView<'_>) -> Box<dyn Listener> {
        Box::new(NoDebuggerListener)
    }
}

struct NoDebuggerListener;

/// Removing the statement is only safe where it stands in a statement list.
/// `if (x) debugger;` would hand its body to the next statement.
fn removal_is_safe(cx: &RuleContext<'_>) -> bool {
    match cx.prev_significant() {
        None => true,
        Some(prev) => matches!(cx.token_text(prev), ";" | "{" | "}"),
    }
}

impl Listener for NoDebuggerListener {
    fn identifier(&mut self, cx: &mut RuleContext<'_>, token: Token) {
        if cx.token_text(token) != "debugger" {
            return;
        }
        // `obj.debugger`, `{ debugger: 1 }`
        if cx.preceded_by(".") || cx.followed_by(":") {
            return;
        }

        let mut report = Report::new(
            token.range,
            RuleMessage::new("noDebugger", "Unexpected 'debugger' statement."),
        );
        if removal_is_safe(cx) {
            let mut removal = token.range;
            if let Some(next) = cx.next_significant() {
                if cx.token_text(next) == ";" {
                    removal = removal.cover(next.range);
                }
            }
            report = report.with_fix(Fix::remove(removal));
        }
        cx.report(report);
    }
}
