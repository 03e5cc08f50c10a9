//! Parsing of `gomote` text output.
//!
//! Pure functions kept at the adapter boundary so the output format can
//! change without touching the session or fleet logic.

use crate::domain::{BackendError, WorkerHandle};

/// Header line that precedes the instance type list in `gomote create`.
const TYPES_HEADER: &str = "Valid types:";

/// Parse `gomote list`: one worker per line, `<id>\t<type>[\t...]`.
///
/// # Errors
///
/// Returns `BackendError::Malformed` for a line without at least two
/// tab-separated fields.
pub fn parse_instance_list(text: &str) -> Result<Vec<WorkerHandle>, BackendError> {
    let mut workers = Vec::new();
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let mut fields = line.split('\t');
        match (fields.next(), fields.next()) {
            (Some(id), Some(kind)) => workers.push(WorkerHandle::new(id.trim(), kind.trim())),
            _ => {
                return Err(BackendError::Malformed {
                    op: "gomote list".to_string(),
                    line: line.to_string(),
                });
            }
        }
    }
    Ok(workers)
}

/// Parse the instance types printed by a bare `gomote create`.
///
/// Everything up to the `Valid types:` header is ignored. After it, each
/// line reads `  * <type> [<notes>]`.
///
/// # Errors
///
/// Returns `BackendError::Malformed` for a type line with no `*`, nothing
/// after the `*`, or a `[` before the `*`.
pub fn parse_instance_types(text: &str) -> Result<Vec<String>, BackendError> {
    let malformed = |line: &str| BackendError::Malformed {
        op: "gomote create".to_string(),
        line: line.to_string(),
    };

    let mut types = Vec::new();
    let mut lines = text.lines().skip_while(|l| !l.starts_with(TYPES_HEADER));
    if lines.next().is_none() {
        return Ok(types);
    }
    for line in lines.filter(|l| !l.trim().is_empty()) {
        let start = match line.find('*') {
            Some(i) if i + 1 < line.len() => i + 1,
            _ => return Err(malformed(line)),
        };
        let end = line.find('[').unwrap_or(line.len());
        if end < start {
            return Err(malformed(line));
        }
        types.push(line[start..end].trim().to_string());
    }
    Ok(types)
}
