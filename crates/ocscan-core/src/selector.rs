use serde_json::Value;

use crate::matcher::SelectionRule;
use crate::path::Step;

/// Expected shape of a path leading to write tool content
enum Segment {
    Field(&'static str),
    AnyIndex,
}

/// `.messages[i].parts[j].state.input.content`
const CONTENT_SHAPE: [Segment; 7] = [
    Segment::Field("messages"),
    Segment::AnyIndex,
    Segment::Field("parts"),
    Segment::AnyIndex,
    Segment::Field("state"),
    Segment::Field("input"),
    Segment::Field("content"),
];

/// Tool name of opencode's file write calls
pub(crate) const DEFAULT_TOOL: &str = "write";

/// Part `type` values marking a tool call. Current opencode exports use
/// `tool`; `tool-call` is accepted as well.
pub(crate) const DEFAULT_TOOL_TYPES: [&str; 2] = ["tool", "tool-call"];

/// Depth at which a path addresses a single message part
const PART_DEPTH: usize = 4;

/// Selects the content written by write tool calls.
///
/// A part qualifies when its `type` is one of the tool-call discriminants and
/// its `tool` equals the configured tool name. Nothing outside
/// `messages[].parts[].state.input.content` is ever tested.
#[derive(Debug, Clone)]
pub struct WriteToolRule {
    tool: String,
    tool_types: Vec<String>,
}

impl WriteToolRule {
    pub fn new(tool: impl Into<String>, tool_types: Vec<String>) -> Self {
        Self {
            tool: tool.into(),
            tool_types,
        }
    }

    fn is_tool_call(&self, part: &Value) -> bool {
        let part_type = part.get("type").and_then(Value::as_str);
        let tool = part.get("tool").and_then(Value::as_str);
        match (part_type, tool) {
            (Some(part_type), Some(tool)) => {
                tool == self.tool && self.tool_types.iter().any(|t| t == part_type)
            }
            _ => false,
        }
    }
}

impl Default for WriteToolRule {
    fn default() -> Self {
        Self::new(
            DEFAULT_TOOL,
            DEFAULT_TOOL_TYPES.iter().map(|t| t.to_string()).collect(),
        )
    }
}

impl SelectionRule for WriteToolRule {
    fn approve_descent(&self, path: &[Step], node: &Value) -> bool {
        if !follows_shape(path) {
            return false;
        }
        path.len() != PART_DEPTH || self.is_tool_call(node)
    }

    fn is_match_site(&self, path: &[Step]) -> bool {
        path.len() == CONTENT_SHAPE.len() && follows_shape(path)
    }
}

fn follows_shape(path: &[Step]) -> bool {
    path.len() <= CONTENT_SHAPE.len()
        && path
            .iter()
            .zip(CONTENT_SHAPE.iter())
            .all(|(step, segment)| match (step, segment) {
                (Step::Field(name), Segment::Field(expected)) => name.as_str() == *expected,
                (Step::Index(_), Segment::AnyIndex) => true,
                _ => false,
            })
}
