//! Checks with fully controlled output, for engine-level tests.

use headlint_domain::{Check, Listener, Report, RuleContext, SourceView, Token};
use headlint_types::{RuleMessage, TextRange};

/// Reports `foo` identifiers with message id `no-foo-found`.
pub struct NoFoo;

struct NoFooListener;

impl Listener for NoFooListener {
    fn identifier(&mut self, cx: &mut RuleContext<'_>, token: Token) {
        if cx.token_text(token) == "foo" {
            cx.report(Report::new(
                token.range,
                RuleMessage::new("no-foo-found", "foo is not allowed"),
            ));
        }
    }
}

impl Check for NoFoo {
    fn name(&self) -> &'static str {
        "no-foo"
    }

    fn description(&self) -> &'static str {
        "Flags foo"
    }

    fn listeners(&self, _source: &SourceView<'_>) -> Box<dyn Listener> {
        Box::new(NoFooListener)
    }
}

/// Reports a fixed list of ranges, in list order, at end of every file.
pub struct ScriptedCheck {
    name: &'static str,
    ranges: Vec<TextRange>,
}

impl ScriptedCheck {
    pub fn new(name: &'static str, ranges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self {
            name,
            ranges: ranges
                .into_iter()
                .map(|(pos, end)| TextRange::new(pos, end))
                .collect(),
        }
    }
}

struct ScriptedListener {
    ranges: Vec<TextRange>,
}

impl Listener for ScriptedListener {
    fn end_of_file(&mut self, cx: &mut RuleContext<'_>) {
        for (i, range) in self.ranges.iter().enumerate() {
            cx.report(Report::new(
                *range,
                RuleMessage::new("scripted", format!("finding {i}")),
            ));
        }
    }
}

impl Check for ScriptedCheck {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        "Reports scripted ranges"
    }

    fn listeners(&self, _source: &SourceView<'_>) -> Box<dyn Listener> {
        Box::new(ScriptedListener {
            ranges: self.ranges.clone(),
        })
    }
}

/// Panics when run on a file whose text contains `trigger`.
pub struct PanicOn {
    pub trigger: &'static str,
}

impl Check for PanicOn {
    fn name(&self) -> &'static str {
        "panic-on"
    }

    fn description(&self) -> &'static str {
        "Panics on a trigger string"
    }

    fn listeners(&self, source: &SourceView<'_>) -> Box<dyn Listener> {
        if source.text.contains(self.trigger) {
            panic!("check blew up on {}", source.path);
        }
        Box::new(Silent)
    }
}

struct Silent;

impl Listener for Silent {}
