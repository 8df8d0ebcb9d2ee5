//! Slash-normalized path handling.
//!
//! Paths coming from the parent process and paths discovered on disk are
//! compared as strings, so both sides go through [`normalize_path`] first.

/// True when `path` is absolute: `/x`, `C:/x`, `C:\x` or a UNC `//server/x`.
pub fn is_rooted(path: &str) -> bool {
    root_len(&path.replace('\\', "/")) > 0
}

fn root_len(path: &str) -> usize {
    let bytes = path.as_bytes();
    if path.starts_with("//") {
        return 2;
    }
    if path.starts_with('/') {
        return 1;
    }
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        if bytes.get(2) == Some(&b'/') {
            return 3;
        }
        return 2;
    }
    0
}

/// Forward slashes, no empty or `.` segments, `..` resolved lexically.
///
/// A `..` at the root is dropped; a leading `..` on a relative path is kept.
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    let root_end = root_len(&path);
    let (root, rest) = path.split_at(root_end);

    let mut segments: Vec<&str> = Vec::new();
    for segment in rest.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if !root.is_empty() => {}
                _ => segments.push(".."),
            },
            s => segments.push(s),
        }
    }

    let mut out = String::with_capacity(path.len());
    out.push_str(root);
    out.push_str(&segments.join("/"));
    if out.is_empty() {
        out.push('.');
    }
    out
}

/// Resolve `path` against `cwd` unless it is already rooted, then normalize.
pub fn combine_paths(cwd: &str, path: &str) -> String {
    if is_rooted(path) || cwd.is_empty() {
        return normalize_path(path);
    }
    normalize_path(&format!("{cwd}/{path}"))
}
