//! The game-file parser: plain text in, header blob and fork table out.
//!
//! A game file is a prelude of `key value` option lines followed by one or
//! more forks, each introduced by an `@name` header line. Within a fork,
//! `if … endif` pairs nest into a block tree; everything else is raw text
//! the interpreter dispatches line by line.

use std::path::{Path, PathBuf};

use crate::error::{ScriptError, ScriptResult};
use crate::tree::{ForkTree, ParseNode};

/// A parsed game file: options header plus the ordered fork table.
///
/// Insertion order is significant — the first fork is the default entry
/// point and the restart target.
#[derive(Debug, Clone)]
pub struct GameFile {
    /// Where the file was read from.
    pub path: PathBuf,
    /// Everything above the first fork header.
    pub header: String,
    forks: Vec<(String, ForkTree)>,
}

impl GameFile {
    /// Look up a fork by normalized name.
    pub fn fork(&self, name: &str) -> Option<&ForkTree> {
        self.forks
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, tree)| tree)
    }

    /// True when a fork with this normalized name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.forks.iter().any(|(n, _)| n == name)
    }

    /// The first fork declared in the file, if any.
    pub fn first_fork(&self) -> Option<&str> {
        self.forks.first().map(|(n, _)| n.as_str())
    }

    /// Fork names in declaration order.
    pub fn fork_names(&self) -> impl Iterator<Item = &str> {
        self.forks.iter().map(|(n, _)| n.as_str())
    }

    /// Number of forks.
    pub fn len(&self) -> usize {
        self.forks.len()
    }

    /// True when the file declares no forks.
    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }
}

/// Normalize a fork name: lowercased, all whitespace removed.
pub fn normalize_fork_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Read and parse a game file from disk.
pub fn parse_file(path: &Path) -> ScriptResult<GameFile> {
    let raw = std::fs::read_to_string(path).map_err(|source| ScriptError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&raw, path)
}

/// Parse game-file text. `path` is recorded for resource resolution and
/// error messages only.
pub fn parse_source(raw: &str, path: &Path) -> ScriptResult<GameFile> {
    // Strip carriage returns and trailing whitespace per line.
    let lines: Vec<&str> = raw.split('\n').map(|l| l.trim_end()).collect();

    // Partition into header lines and (name, body, offsets) entries.
    let mut header_lines: Vec<&str> = Vec::new();
    let mut entries: Vec<(String, Vec<&str>, usize)> = Vec::new();
    let mut offset = 0usize;

    for &line in &lines {
        let line_span = offset..offset + line.len();
        if let Some(rest) = line.strip_prefix('@') {
            let name = normalize_fork_name(rest);
            if name.is_empty() {
                return Err(ScriptError::EmptyForkName { span: line_span });
            }
            if entries.iter().any(|(n, _, _)| *n == name) {
                return Err(ScriptError::DuplicateFork {
                    name,
                    span: line_span,
                });
            }
            entries.push((name, Vec::new(), offset + line.len() + 1));
        } else if let Some((_, body, _)) = entries.last_mut() {
            body.push(line);
        } else {
            header_lines.push(line);
        }
        offset += line.len() + 1;
    }

    if entries.is_empty() {
        return Err(ScriptError::EmptyFile {
            path: path.to_path_buf(),
        });
    }

    let mut forks = Vec::with_capacity(entries.len());
    for (name, body_lines, entry_start) in entries {
        let body = strip_comments(&body_lines.join("\n"));
        let tree = build_tree(&name, &body, entry_start)?;
        forks.push((name, tree));
    }

    Ok(GameFile {
        path: path.to_path_buf(),
        header: header_lines.join("\n"),
        forks,
    })
}

/// Remove `//` comments from an entry body.
///
/// A `//` is a comment only when it sits outside `{ }` on its line and the
/// line contains no `@` (option lines keep their text verbatim). Deleting a
/// comment shifts every later index, so the scan restarts after each hit and
/// terminates once a full pass finds nothing. The operation is idempotent.
pub fn strip_comments(body: &str) -> String {
    let mut text = body.to_string();
    'rescan: loop {
        let mut from = 0;
        while let Some(rel) = text[from..].find("//") {
            let idx = from + rel;
            let (line_start, line_end) = line_bounds(&text, idx);
            let line = &text[line_start..line_end];
            if !line.contains('@') && !inside_braces(line, idx - line_start) {
                text.replace_range(idx..line_end, "");
                continue 'rescan;
            }
            from = idx + 2;
        }
        break;
    }
    text
}

/// The `if`/`endif` events found in an entry body, tagged by kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockToken {
    If,
    Endif,
}

impl BlockToken {
    fn len(self) -> usize {
        match self {
            BlockToken::If => 2,
            BlockToken::Endif => 5,
        }
    }
}

/// Build the block tree for one fork body.
///
/// `entry_start` offsets error spans into the whole-file source; spans are
/// approximate when comments were stripped earlier in the entry.
fn build_tree(fork: &str, body: &str, entry_start: usize) -> ScriptResult<ForkTree> {
    let mut events: Vec<(usize, BlockToken)> = Vec::new();
    for pos in token_positions(body, "if") {
        events.push((pos, BlockToken::If));
    }
    for pos in token_positions(body, "endif") {
        events.push((pos, BlockToken::Endif));
    }
    events.sort_by_key(|(pos, _)| *pos);

    let ifs = events.iter().filter(|e| e.1 == BlockToken::If).count();
    if ifs * 2 != events.len() {
        let span = events
            .last()
            .map(|(pos, kind)| entry_start + pos..entry_start + pos + kind.len())
            .unwrap_or(entry_start..entry_start);
        return Err(ScriptError::UnbalancedIf {
            fork: fork.to_string(),
            span,
        });
    }

    let mut tree = ForkTree::new();
    if events.is_empty() {
        tree.node_mut(tree.root()).text = body.to_string();
        return Ok(tree);
    }

    let mut stack = vec![tree.root()];
    let mut boundary = 0usize;

    for (pos, kind) in events {
        if pos < boundary {
            return Err(ScriptError::MultiplePerLine {
                fork: fork.to_string(),
                span: entry_start + pos..entry_start + pos + kind.len(),
            });
        }

        let current = *stack.last().unwrap_or(&tree.root());
        let span_text = &body[boundary..pos];
        if !span_text.trim().is_empty() {
            tree.push_child(
                current,
                ParseNode {
                    text: span_text.to_string(),
                    ..Default::default()
                },
            );
        }

        let line_end = body[pos..]
            .find('\n')
            .map(|p| pos + p)
            .unwrap_or(body.len());

        match kind {
            BlockToken::If => {
                let child = tree.push_child(
                    current,
                    ParseNode {
                        condition: body[pos..line_end].to_string(),
                        ..Default::default()
                    },
                );
                stack.push(child);
            }
            BlockToken::Endif => {
                stack.pop();
                if stack.is_empty() {
                    return Err(ScriptError::UnbalancedIf {
                        fork: fork.to_string(),
                        span: entry_start + pos..entry_start + pos + kind.len(),
                    });
                }
            }
        }

        boundary = (line_end + 1).min(body.len());
    }

    let tail = &body[boundary..];
    if !tail.trim().is_empty() {
        let current = *stack.last().unwrap_or(&tree.root());
        tree.push_child(
            current,
            ParseNode {
                text: tail.to_string(),
                ..Default::default()
            },
        );
    }

    Ok(tree)
}

/// Whole-word occurrences of `word` in `body`, skipping any that sit inside
/// `{ }` on their line or on a line containing `@`.
fn token_positions(body: &str, word: &str) -> Vec<usize> {
    let bytes = body.as_bytes();
    let mut out = Vec::new();
    let mut from = 0;

    while let Some(rel) = body[from..].find(word) {
        let idx = from + rel;
        from = idx + word.len();

        let before_ok = idx == 0 || !is_word_byte(bytes[idx - 1]);
        let end = idx + word.len();
        let after_ok = end >= bytes.len() || !is_word_byte(bytes[end]);
        if !before_ok || !after_ok {
            continue;
        }

        let (line_start, line_end) = line_bounds(body, idx);
        let line = &body[line_start..line_end];
        if line.contains('@') || inside_braces(line, idx - line_start) {
            continue;
        }

        out.push(idx);
    }

    out
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Start and end (exclusive, before the newline) of the line containing `idx`.
fn line_bounds(text: &str, idx: usize) -> (usize, usize) {
    let start = text[..idx].rfind('\n').map(|p| p + 1).unwrap_or(0);
    let end = text[idx..].find('\n').map(|p| idx + p).unwrap_or(text.len());
    (start, end)
}

/// True when column `col` of `line` sits inside an unclosed `{`.
fn inside_braces(line: &str, col: usize) -> bool {
    let mut depth = 0usize;
    for c in line[..col].chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    depth > 0
}
