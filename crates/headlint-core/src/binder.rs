use std::collections::HashMap;

use headlint_types::HeadlessConfig;
use tracing::debug;

use crate::program::{Program, SourceFile};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("file {path} is not matched by tsconfig")]
    NotMatched { path: String },
}

/// A program file paired with the check names enabled for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundFile<'p> {
    pub file: &'p SourceFile,
    pub rules: Vec<String>,
}

/// Resolve every configured path to a program file.
///
/// All-or-nothing: the first path the program does not contain fails the
/// whole bind. Entries naming the same file are merged into one bound file
/// carrying the union of their rule names, first occurrence first.
pub fn bind_files<'p>(
    program: &'p Program,
    config: &HeadlessConfig,
) -> Result<Vec<BoundFile<'p>>, BindError> {
    let mut bound: Vec<BoundFile<'p>> = Vec::with_capacity(config.files.len());
    let mut index_by_name: HashMap<&'p str, usize> = HashMap::new();

    for entry in &config.files {
        let file = program
            .source_file(&entry.file_path)
            .ok_or_else(|| BindError::NotMatched {
                path: entry.file_path.clone(),
            })?;

        match index_by_name.get(file.file_name()) {
            Some(&i) => {
                debug!("Merging duplicate entry for {}", file.file_name());
                merge_rules(&mut bound[i].rules, &entry.rules);
            }
            None => {
                index_by_name.insert(file.file_name(), bound.len());
                let mut rules = Vec::with_capacity(entry.rules.len());
                merge_rules(&mut rules, &entry.rules);
                bound.push(BoundFile { file, rules });
            }
        }
    }

    debug!("Bound {} file(s)", bound.len());
    Ok(bound)
}

fn merge_rules(into: &mut Vec<String>, rules: &[String]) {
    for rule in rules {
        if !into.contains(rule) {
            into.push(rule.clone());
        }
    }
}
