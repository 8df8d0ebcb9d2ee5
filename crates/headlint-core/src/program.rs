//! The program model: every source file a project configuration selects.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use headlint_domain::{TokenKind, combine_paths, normalize_path, tokenize};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error("failed to read '{path}': {source}")]
    Read { path: String, source: io::Error },

    #[error("failed to parse '{path}': {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("invalid glob '{glob}' in '{path}': {source}")]
    InvalidGlob {
        path: String,
        glob: String,
        source: globset::Error,
    },

    #[error("file '{path}' listed in '{config}' not found")]
    MissingFile { path: String, config: String },

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: String,
        source: walkdir::Error,
    },
}

/// One source file of the program. Bound files and findings refer to it by
/// its normalized absolute `file_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    file_name: String,
    text: String,
}

impl SourceFile {
    pub fn new(file_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            text: text.into(),
        }
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Source files keyed by normalized path.
#[derive(Debug, Clone, Default)]
pub struct Program {
    cwd: String,
    files: BTreeMap<String, SourceFile>,
}

impl Program {
    /// Build a program from `(path, text)` pairs; relative paths resolve
    /// against `cwd`.
    pub fn from_sources<P, T>(cwd: &str, sources: impl IntoIterator<Item = (P, T)>) -> Self
    where
        P: AsRef<str>,
        T: Into<String>,
    {
        let cwd = normalize_path(cwd);
        let files = sources
            .into_iter()
            .map(|(path, text)| {
                let name = combine_paths(&cwd, path.as_ref());
                (name.clone(), SourceFile::new(name, text))
            })
            .collect();
        Self { cwd, files }
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    /// File handle by path. Relative paths resolve against the program's cwd.
    pub fn source_file(&self, path: &str) -> Option<&SourceFile> {
        self.files.get(&combine_paths(&self.cwd, path))
    }

    pub fn source_files(&self) -> impl Iterator<Item = &SourceFile> + '_ {
        self.files.values()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Builds a [`Program`] from a project configuration file.
pub trait ProgramHost {
    fn create_program(&self, tsconfig: &Path, cwd: &Path) -> Result<Program, ProgramError>;
}

const TS_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];
const JS_EXTENSIONS: &[&str] = &["js", "jsx", "mjs", "cjs"];
const DEFAULT_INCLUDE: &[&str] = &["**/*"];
const DEFAULT_EXCLUDE: &[&str] = &["node_modules/**", "**/node_modules/**"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectFile {
    files: Option<Vec<String>>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    #[serde(default)]
    allow_js: bool,
}

/// Reads a tsconfig-style project file from disk and loads the files it
/// selects.
///
/// Supported keys: `files`, `include`, `exclude` and
/// `compilerOptions.allowJs`. Comments and trailing commas are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProgramHost;

impl ProgramHost for FsProgramHost {
    fn create_program(&self, tsconfig: &Path, cwd: &Path) -> Result<Program, ProgramError> {
        let cwd = normalize_path(&cwd.to_string_lossy());
        let config_path = combine_paths(&cwd, &tsconfig.to_string_lossy());
        info!("Loading project from {}", config_path);

        let raw = fs::read_to_string(&config_path).map_err(|source| ProgramError::Read {
            path: config_path.clone(),
            source,
        })?;
        let project: ProjectFile =
            serde_json::from_str(&strip_jsonc(&raw)).map_err(|source| ProgramError::Parse {
                path: config_path.clone(),
                source,
            })?;

        let root = parent_dir(&config_path);
        let mut names: Vec<String> = Vec::new();

        if let Some(files) = &project.files {
            for file in files {
                let name = combine_paths(&root, file);
                if !Path::new(&name).is_file() {
                    return Err(ProgramError::MissingFile {
                        path: name,
                        config: config_path.clone(),
                    });
                }
                names.push(name);
            }
        }

        let include: Vec<String> = match (&project.include, &project.files) {
            (Some(include), _) => include.clone(),
            (None, Some(_)) => Vec::new(),
            (None, None) => DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
        };
        if !include.is_empty() {
            let exclude: Vec<String> = project
                .exclude
                .clone()
                .unwrap_or_else(|| DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect());
            let include_set = compile_patterns(&include, &config_path)?;
            let exclude_set = compile_patterns(&exclude, &config_path)?;
            let allow_js = project.compiler_options.allow_js;
            names.extend(walk_sources(&root, &include_set, &exclude_set, allow_js)?);
        }

        let mut files = BTreeMap::new();
        for name in names {
            if files.contains_key(&name) {
                continue;
            }
            let text = fs::read_to_string(&name).map_err(|source| ProgramError::Read {
                path: name.clone(),
                source,
            })?;
            files.insert(name.clone(), SourceFile::new(name, text));
        }

        debug!("Program has {} source file(s)", files.len());
        Ok(Program { cwd, files })
    }
}

fn parent_dir(path: &str) -> String {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => normalize_path(&parent.to_string_lossy()),
        _ => ".".to_string(),
    }
}

/// Compile project globs. A pattern also matches everything below it, so
/// `"src"` selects `src/**`.
fn compile_patterns(patterns: &[String], config_path: &str) -> Result<GlobSet, ProgramError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let pattern = normalize_path(pattern);
        let pattern = pattern.strip_prefix("./").unwrap_or(&pattern);
        let mut candidates = vec![pattern.to_string(), format!("{pattern}/**")];
        // `node_modules/**` should also prune the `node_modules` directory itself.
        if let Some(dir) = pattern.strip_suffix("/**") {
            candidates.push(dir.to_string());
        }
        for candidate in candidates {
            let glob = GlobBuilder::new(&candidate)
                .literal_separator(true)
                .build()
                .map_err(|source| ProgramError::InvalidGlob {
                    path: config_path.to_string(),
                    glob: candidate.clone(),
                    source,
                })?;
            builder.add(glob);
        }
    }
    builder.build().map_err(|source| ProgramError::InvalidGlob {
        path: config_path.to_string(),
        glob: patterns.join(", "),
        source,
    })
}

fn has_source_extension(path: &Path, allow_js: bool) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    TS_EXTENSIONS.contains(&ext) || (allow_js && JS_EXTENSIONS.contains(&ext))
}

fn walk_sources(
    root: &str,
    include: &GlobSet,
    exclude: &GlobSet,
    allow_js: bool,
) -> Result<Vec<String>, ProgramError> {
    let root_path = PathBuf::from(root);
    let relative = |path: &Path| -> String {
        let rel = path.strip_prefix(&root_path).unwrap_or(path);
        rel.to_string_lossy().replace('\\', "/")
    };

    let mut out = Vec::new();
    let walker = WalkDir::new(&root_path)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !exclude.is_match(relative(entry.path())));

    for entry in walker {
        let entry = entry.map_err(|source| ProgramError::Walk {
            path: root.to_string(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative(entry.path());
        if include.is_match(&rel) && has_source_extension(entry.path(), allow_js) {
            out.push(combine_paths(root, &rel));
        }
    }
    Ok(out)
}

/// Blank out comments and trailing commas so the text parses as JSON.
///
/// Byte offsets are preserved, so parse errors still point at the right
/// place in the original file.
fn strip_jsonc(raw: &str) -> String {
    let tokens = tokenize(raw);
    let mut out = raw.as_bytes().to_vec();
    for (i, token) in tokens.iter().enumerate() {
        let blank = match token.kind {
            TokenKind::Comment => true,
            TokenKind::Punctuation if token.text(raw) == "," => tokens[i + 1..]
                .iter()
                .find(|t| t.kind != TokenKind::Comment)
                .is_some_and(|next| matches!(next.text(raw), "}" | "]")),
            _ => false,
        };
        if blank {
            for byte in &mut out[token.range.pos..token.range.end] {
                if *byte != b'\n' {
                    *byte = b' ';
                }
            }
        }
    }
    // Only whole tokens were blanked and every token boundary is a char
    // boundary, so the result is still UTF-8.
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_file_lookup_normalizes() {
        let program = Program::from_sources("/proj", [("src/a.ts", "let a;"), ("/abs/b.ts", "b")]);
        assert_eq!(program.len(), 2);
        assert!(program.source_file("/proj/src/a.ts").is_some());
        assert!(program.source_file("src/a.ts").is_some());
        assert!(program.source_file("./src/../src/a.ts").is_some());
        assert!(program.source_file("\\abs\\b.ts").is_some());
        assert!(program.source_file("/proj/src/missing.ts").is_none());
        assert_eq!(
            program.source_file("src/a.ts").map(SourceFile::file_name),
            Some("/proj/src/a.ts")
        );
    }

    #[test]
    fn strip_jsonc_removes_comments_and_trailing_commas() {
        let raw = r#"{
  // comment
  "include": ["src", /* inline */ "lib",],
  "compilerOptions": { "allowJs": true, },
}"#;
        let stripped = strip_jsonc(raw);
        assert_eq!(stripped.len(), raw.len());
        let project: ProjectFile = serde_json::from_str(&stripped).unwrap();
        assert_eq!(
            project.include,
            Some(vec!["src".to_string(), "lib".to_string()])
        );
        assert!(project.compiler_options.allow_js);
    }

    #[test]
    fn strip_jsonc_keeps_comment_markers_inside_strings() {
        let raw = r#"{"files": ["a//b.ts", "c/*d*/.ts"]}"#;
        assert_eq!(strip_jsonc(raw), raw);
    }

    #[test]
    fn extension_filter() {
        assert!(has_source_extension(Path::new("a.ts"), false));
        assert!(has_source_extension(Path::new("a.d.ts"), false));
        assert!(has_source_extension(Path::new("a.tsx"), false));
        assert!(!has_source_extension(Path::new("a.js"), false));
        assert!(has_source_extension(Path::new("a.js"), true));
        assert!(!has_source_extension(Path::new("a.json"), true));
        assert!(!has_source_extension(Path::new("Makefile"), true));
    }

    #[test]
    fn patterns_match_directories_and_globs() {
        let set = compile_patterns(&["src".to_string(), "./lib/*.ts".to_string()], "/t.json")
            .unwrap();
        assert!(set.is_match("src/a.ts"));
        assert!(set.is_match("src/deep/a.ts"));
        assert!(set.is_match("lib/a.ts"));
        assert!(!set.is_match("lib/deep/a.ts"));
        assert!(!set.is_match("test/a.ts"));
    }

    #[test]
    fn default_exclude_prunes_node_modules_directories() {
        let exclude: Vec<String> = DEFAULT_EXCLUDE.iter().map(|s| s.to_string()).collect();
        let set = compile_patterns(&exclude, "/t.json").unwrap();
        assert!(set.is_match("node_modules"));
        assert!(set.is_match("packages/x/node_modules"));
        assert!(set.is_match("node_modules/pkg/index.ts"));
        assert!(!set.is_match("src/node_modules_helper.ts"));
    }
}
