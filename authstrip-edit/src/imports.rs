//! Best-effort placement of the bypass-import marker.
//!
//! Only top-level imports count: a line that starts, with no indentation, with
//! `import ` or `from ... import`. Imports inside functions, `try:` blocks or
//! `if` blocks are indented and therefore ignored. A parenthesized or
//! backslash-continued import ends on the line that closes it.

/// Inserts `lines` right after the last top-level import.
///
/// Returns `None` when the content has no top-level import or `lines` is empty.
/// The line-ending style of the import line (LF or CRLF) is reused.
pub fn insert_after_last_import(content: &str, lines: &[String]) -> Option<String> {
    if lines.is_empty() {
        return None;
    }

    let end = last_import_end(content)?;
    let newline = newline_at(content, end);
    let import_line_terminated = content[..end].ends_with('\n');

    let mut block = String::new();
    if !import_line_terminated {
        block.push_str(newline);
    }
    for (i, line) in lines.iter().enumerate() {
        block.push_str(line);
        if import_line_terminated || i + 1 < lines.len() {
            block.push_str(newline);
        }
    }

    let mut out = String::with_capacity(content.len() + block.len());
    out.push_str(&content[..end]);
    out.push_str(&block);
    out.push_str(&content[end..]);
    Some(out)
}

/// Byte offset just past the last top-level import statement (including its newline).
pub fn last_import_end(content: &str) -> Option<usize> {
    let mut lines = Vec::new();
    let mut offset = 0usize;
    for line in content.split_inclusive('\n') {
        lines.push((offset, line));
        offset += line.len();
    }

    let mut last = None;
    let mut i = 0usize;
    while i < lines.len() {
        let text = strip_eol(lines[i].1);
        if !is_import_start(text) {
            i += 1;
            continue;
        }

        let mut j = i;
        let mut depth = paren_delta(text);
        let mut continued = text.ends_with('\\');
        while (depth > 0 || continued) && j + 1 < lines.len() {
            j += 1;
            let t = strip_eol(lines[j].1);
            depth += paren_delta(t);
            continued = t.ends_with('\\');
        }

        let (start, line) = lines[j];
        last = Some(start + line.len());
        i = j + 1;
    }
    last
}

fn is_import_start(text: &str) -> bool {
    text.starts_with("import ") || (text.starts_with("from ") && text.contains(" import"))
}

fn strip_eol(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn paren_delta(text: &str) -> i32 {
    let code = text.split('#').next().unwrap_or(text);
    code.chars().fold(0, |acc, c| match c {
        '(' => acc + 1,
        ')' => acc - 1,
        _ => acc,
    })
}

/// Newline convention for text inserted at `end`.
fn newline_at(content: &str, end: usize) -> &'static str {
    let before = &content[..end];
    if before.ends_with("\r\n") {
        "\r\n"
    } else if before.ends_with('\n') {
        "\n"
    } else if content.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}
