use std::sync::Arc;

use headlint_types::Finding;

use crate::check::{Check, Listener, RuleContext, SourceView, dispatch};

/// Run `checks` over one file.
///
/// The text is tokenized once. Each token is offered to every check's
/// listener in the order the checks are given, then every listener sees
/// end of file. Findings go to `sink` as soon as they are reported.
pub fn lint_source(
    path: &str,
    text: &str,
    checks: &[Arc<dyn Check>],
    sink: &mut dyn FnMut(Finding),
) {
    if checks.is_empty() {
        return;
    }

    let source = SourceView::new(path, text);
    let mut listeners: Vec<(&'static str, Box<dyn Listener>)> = checks
        .iter()
        .map(|check| (check.name(), check.listeners(&source)))
        .collect();

    for (index, &token) in source.tokens.iter().enumerate() {
        for (rule, listener) in listeners.iter_mut() {
            let mut cx = RuleContext::new(&source, *rule, index, &mut *sink);
            dispatch(&mut **listener, &mut cx, token);
        }
    }

    let eof = source.tokens.len();
    for (rule, listener) in listeners.iter_mut() {
        let mut cx = RuleContext::new(&source, *rule, eof, &mut *sink);
        listener.end_of_file(&mut cx);
    }
}
