//! Built-in checks.

use std::sync::Arc;

use crate::check::Check;

mod ban_ts_comment;
mod no_debugger;
mod no_explicit_any;
mod no_var;

pub use ban_ts_comment::BanTsComment;
pub use no_debugger::NoDebugger;
pub use no_explicit_any::NoExplicitAny;
pub use no_var::NoVar;

/// Every built-in check, in registration order.
pub fn all() -> Vec<Arc<dyn Check>> {
    vec![
        Arc::new(NoDebugger),
        Arc::new(NoExplicitAny),
        Arc::new(NoVar),
        Arc::new(BanTsComment),
    ]
}

#[cfg(test)]
pub(crate) mod test_support {
    use headlint_types::Finding;

    use crate::check::Check;
    use crate::lint::lint_source;

    pub fn lint_one(check: impl Check + 'static, text: &str) -> Vec<Finding> {
        let checks: Vec<std::sync::Arc<dyn Check>> = vec![std::sync::Arc::new(check)];
        let mut out = Vec::new();
        lint_source("/test.ts", text, &checks, &mut |f: Finding| out.push(f));
        out
    }

    /// Apply non-overlapping fixes, last first.
    pub fn apply(text: &str, fixes: &[headlint_types::Fix]) -> String {
        let mut sorted: Vec<_> = fixes.iter().collect();
        sorted.sort_by_key(|f| std::cmp::Reverse(f.range.pos));
        let mut out = text.to_string();
        for fix in sorted {
            out.replace_range(fix.range.pos..fix.range.end, &fix.text);
        }
        out
    }
}
