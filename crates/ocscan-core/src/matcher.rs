use serde_json::Value;

use crate::path::{PathBuilder, QueryPath, Step};

/// Decides which parts of a document the matcher looks at
pub trait SelectionRule {
    /// Whether to visit `node`, found at `path`. Refusing a node skips its
    /// whole subtree.
    fn approve_descent(&self, path: &[Step], node: &Value) -> bool;

    /// Whether a string found at `path` should be tested with the predicate
    fn is_match_site(&self, path: &[Step]) -> bool;
}

/// Selects every string in the document
#[derive(Debug, Default, Clone, Copy)]
pub struct EveryString;

impl SelectionRule for EveryString {
    fn approve_descent(&self, _path: &[Step], _node: &Value) -> bool {
        true
    }

    fn is_match_site(&self, _path: &[Step]) -> bool {
        true
    }
}

/// A string value and where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub value: String,
    pub path: QueryPath,
}

/// Walk `root` depth-first in document order and collect every string that
/// `selector` approves and `predicate` accepts.
pub fn find_matches<R, P>(root: &Value, selector: &R, predicate: P) -> Vec<Match>
where
    R: SelectionRule + ?Sized,
    P: Fn(&str) -> bool,
{
    let mut walker = Walker {
        selector,
        predicate,
        builder: PathBuilder::new(),
        matches: Vec::new(),
    };
    walker.visit(root);
    walker.matches
}

struct Walker<'r, R: ?Sized, P> {
    selector: &'r R,
    predicate: P,
    builder: PathBuilder,
    matches: Vec<Match>,
}

impl<R, P> Walker<'_, R, P>
where
    R: SelectionRule + ?Sized,
    P: Fn(&str) -> bool,
{
    fn visit(&mut self, node: &Value) {
        if !self.selector.approve_descent(self.builder.steps(), node) {
            return;
        }

        match node {
            Value::String(text) => {
                if self.selector.is_match_site(self.builder.steps()) && (self.predicate)(text) {
                    self.matches.push(Match {
                        value: text.clone(),
                        path: self.builder.snapshot(),
                    });
                }
            }
            Value::Array(items) => {
                for (position, item) in items.iter().enumerate() {
                    self.builder.push_index(position);
                    self.visit(item);
                    self.builder.pop();
                }
            }
            Value::Object(map) => {
                for (name, child) in map {
                    self.builder.push_field(name.as_str());
                    self.visit(child);
                    self.builder.pop();
                }
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rendered(matches: &[Match]) -> Vec<String> {
        matches.iter().map(|m| m.path.render()).collect()
    }

    #[test]
    fn test_every_string_in_document_order() {
        let doc = json!({
            "z": "first",
            "a": ["second", 3, {"b": "third"}],
            "m": null
        });
        let matches = find_matches(&doc, &EveryString, |_| true);
        assert_eq!(rendered(&matches), vec![".z", ".a[0]", ".a[2].b"]);
        assert_eq!(matches[1].value, "second");
    }

    #[test]
    fn test_predicate_filters() {
        let doc = json!(["keep me", "drop", {"x": "keep this too"}]);
        let matches = find_matches(&doc, &EveryString, |s| s.contains("keep"));
        assert_eq!(rendered(&matches), vec!["[0]", "[2].x"]);
    }

    #[test]
    fn test_scalar_root() {
        let doc = json!("hit");
        let matches = find_matches(&doc, &EveryString, |_| true);
        assert_eq!(rendered(&matches), vec!["."]);
    }

    #[test]
    fn test_non_string_scalars_never_match() {
        let doc = json!({"n": 1, "b": true, "z": null});
        assert!(find_matches(&doc, &EveryString, |_| true).is_empty());
    }

    struct OnlyUnder(&'static str);

    impl SelectionRule for OnlyUnder {
        fn approve_descent(&self, path: &[Step], _node: &Value) -> bool {
            match path.first() {
                None => true,
                Some(Step::Field(name)) => name == self.0,
                Some(Step::Index(_)) => false,
            }
        }

        fn is_match_site(&self, path: &[Step]) -> bool {
            path.len() == 2
        }
    }

    #[test]
    fn test_refused_subtree_is_skipped() {
        let doc = json!({
            "skip": ["needle"],
            "keep": ["needle", {"deep": "needle"}]
        });
        let matches = find_matches(&doc, &OnlyUnder("keep"), |s| s == "needle");
        assert_eq!(rendered(&matches), vec![".keep[0]"]);
    }

    #[test]
    fn test_dyn_selector() {
        let doc = json!({"a": "x"});
        let selector: Box<dyn SelectionRule> = Box::new(EveryString);
        let matches = find_matches(&doc, selector.as_ref(), |_| true);
        assert_eq!(matches.len(), 1);
    }
}
