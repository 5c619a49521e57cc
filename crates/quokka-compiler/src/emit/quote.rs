//! Quoting helpers for Dockerfile instruction arguments.

/// Renders `args` as a JSON string array, the Dockerfile exec form.
///
/// # Errors
///
/// Returns the serializer's error; plain string arrays never produce one.
pub fn exec_form(args: &[String]) -> serde_json::Result<String> {
    serde_json::to_string(args)
}

/// Wraps `value` in double quotes, escaping backslashes and quotes.
#[must_use]
pub fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Whether a `COPY` path must be written in JSON form.
#[must_use]
pub fn needs_exec_form(path: &str) -> bool {
    path.chars()
        .any(|c| c.is_whitespace() || matches!(c, '"' | '\''))
}

/// Joins the lines of a shell command with ` \` continuations.
///
/// A backslash already ending a line is dropped so it is not doubled, and
/// so the last line cannot continue into the next instruction.
#[must_use]
pub fn shell_continued(command: &str) -> String {
    command
        .trim()
        .split('\n')
        .map(|line| {
            let line = line.trim_end();
            line.strip_suffix('\\').map_or(line, str::trim_end)
        })
        .collect::<Vec<_>>()
        .join(" \\\n")
}
