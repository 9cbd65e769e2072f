// Stack trace parsing for .NET-formatted frame lines
use crate::domain::StackFrame;
use regex::Regex;
use std::sync::OnceLock;
use tracing::debug;

/// `at Namespace.Type.Method(args) in /path/File.cs:line 42`, with the location optional.
const FRAME_PATTERN: &str = r"^\s*at\s+(?P<frame>[^\s(]+)\s*\((?P<params>[^)]*)\)(?:\s+in\s+(?P<file>.+?):line\s+(?P<line>\S+))?\s*$";

static FRAME_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn frame_regex() -> Option<&'static Regex> {
    match FRAME_REGEX.get_or_init(|| Regex::new(FRAME_PATTERN)) {
        Ok(regex) => Some(regex),
        Err(e) => {
            debug!("Stack frame pattern failed to compile: {e}");
            None
        }
    }
}

/// Parses free-text stack traces into frames.
///
/// Lines that are not frames (exception headers, `--- End of ... ---` markers)
/// are skipped. Text with no recognizable frame yields an empty list; this never fails.
pub fn parse_stack_trace(text: &str) -> Vec<StackFrame> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let Some(regex) = frame_regex() else {
        return Vec::new();
    };

    let frames: Vec<StackFrame> = text
        .lines()
        .filter_map(|line| regex.captures(line))
        .map(|caps| {
            let (class_name, method_name) = split_type_and_method(&caps["frame"]);
            StackFrame {
                file_name: caps
                    .name("file")
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
                class_name: class_name.to_string(),
                method_name: method_name.to_string(),
                line_number: caps
                    .name("line")
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0),
            }
        })
        .collect();

    if frames.is_empty() {
        debug!(
            length = text.len(),
            "Stack trace contained no recognizable frames"
        );
    }

    frames
}

/// Splits `Ns.Type.Method` into type and method, keeping `.ctor`/`.cctor` and
/// generic argument lists (`Method[T]`) on the method side.
fn split_type_and_method(frame: &str) -> (&str, &str) {
    let head_end = frame.find('[').unwrap_or(frame.len());
    let head = &frame[..head_end];

    if let Some(idx) = head.rfind("..") {
        return (&frame[..idx], &frame[idx + 1..]);
    }

    match head.rfind('.') {
        Some(idx) => (&frame[..idx], &frame[idx + 1..]),
        None => ("", frame),
    }
}
