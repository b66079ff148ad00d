//! Recovery of tool calls embedded in a finished answer
//!
//! The backend is instructed to request tools with inline markup:
//!
//! ```text
//! <use tool="Edit">
//! {"file_path": "/tmp/a.py", "old_string": "x", "new_string": "y"}
//! </use>
//! ```

use std::sync::OnceLock;

use regex::Regex;

/// A tool call found in answer text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Value of the `tool` attribute, verbatim
    pub name: String,
    /// Trimmed tag body; expected to be a JSON object but never validated
    pub arguments: String,
    /// Byte offset of the opening marker in the answer
    pub offset: usize,
}

fn use_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?s)<use tool="(.+?)">(.+?)</use>"#).expect("use-tag pattern must compile"))
}

/// Extract every tool invocation from `answer`, in order of appearance
///
/// Matches are non-overlapping and non-greedy, so several invocations in
/// one answer are returned separately. Most answers yield none.
pub fn extract(answer: &str) -> Vec<ToolInvocation> {
    use_tag()
        .captures_iter(answer)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(ToolInvocation {
                name: caps[1].to_owned(),
                arguments: caps[2].trim().to_owned(),
                offset: whole.start(),
            })
        })
        .collect()
}
