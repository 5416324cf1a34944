use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Words jq parses as keywords after a dot on older releases
const JQ_KEYWORDS: &[&str] = &[
    "and", "or", "not", "if", "then", "elif", "else", "end", "as", "def", "reduce", "foreach",
    "try", "catch", "label", "import", "include", "__loc__",
];

/// One step from a node to one of its children
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    Field(String),
    Index(usize),
}

impl Step {
    fn render_into(&self, out: &mut String) {
        match self {
            Step::Field(name) if is_simple_identifier(name) => {
                out.push('.');
                out.push_str(name);
            }
            Step::Field(name) => {
                out.push('.');
                out.push_str(&quote(name));
            }
            Step::Index(position) => {
                out.push('[');
                out.push_str(&position.to_string());
                out.push(']');
            }
        }
    }
}

/// An immutable location inside a JSON document, rooted at the document root.
///
/// Renders in the `jq` path dialect, e.g. `.messages[0].parts[2].state`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QueryPath {
    steps: Vec<Step>,
}

impl QueryPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The first `len` steps of this path
    pub fn prefix(&self, len: usize) -> QueryPath {
        let len = len.min(self.steps.len());
        Self::from_steps(self.steps[..len].to_vec())
    }

    /// The path one step up, or `None` at the root
    pub fn parent(&self) -> Option<QueryPath> {
        if self.steps.is_empty() {
            None
        } else {
            Some(self.prefix(self.steps.len() - 1))
        }
    }

    pub fn render(&self) -> String {
        render_steps(&self.steps)
    }

    /// Follow this path through `document`. Missing fields, out-of-range
    /// indexes and type mismatches all yield `None`.
    pub fn resolve<'v>(&self, document: &'v Value) -> Option<&'v Value> {
        self.steps
            .iter()
            .try_fold(document, |node, step| match (step, node) {
                (Step::Field(name), Value::Object(map)) => map.get(name),
                (Step::Index(position), Value::Array(items)) => items.get(*position),
                _ => None,
            })
    }
}

impl fmt::Display for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for QueryPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

/// Mutable cursor used while walking a tree. Push a step when descending,
/// pop it when returning, snapshot when something is found.
#[derive(Debug, Default)]
pub struct PathBuilder {
    steps: Vec<Step>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_field(&mut self, name: impl Into<String>) {
        self.steps.push(Step::Field(name.into()));
    }

    pub fn push_index(&mut self, position: usize) {
        self.steps.push(Step::Index(position));
    }

    pub fn pop(&mut self) -> Option<Step> {
        self.steps.pop()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    pub fn render(&self) -> String {
        render_steps(&self.steps)
    }

    /// Copy the current location into an immutable path
    pub fn snapshot(&self) -> QueryPath {
        QueryPath::from_steps(self.steps.clone())
    }
}

fn render_steps(steps: &[Step]) -> String {
    if steps.is_empty() {
        return ".".to_string();
    }
    let mut out = String::new();
    for step in steps {
        step.render_into(&mut out);
    }
    out
}

fn is_simple_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    starts_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !JQ_KEYWORDS.contains(&name)
}

/// jq string literals share JSON's escaping rules
fn quote(name: &str) -> String {
    serde_json::to_string(name).unwrap_or_else(|_| format!("\"{}\"", name))
}
