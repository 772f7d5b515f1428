//! Tri-state evaluation of a pattern tree against a line.
//!
//! A plain boolean tree cannot distinguish "this branch rejected the line"
//! from "this branch has nothing to say" (an empty or disabled sub-branch).
//! The third state lets disabled branches stay structurally present without
//! failing every AND or passing every OR.

use super::{NodeId, Operator, PatternTree};

/// Tri-state outcome of evaluating a pattern node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Nomatch,
    /// No opinion: the node (or its whole active subtree) is inert.
    Neither,
}

impl Verdict {
    /// A line is displayed unless something actively rejected it.
    pub fn is_visible(self) -> bool {
        !matches!(self, Verdict::Nomatch)
    }

    /// Swap Match and Nomatch; Neither stays Neither.
    pub fn invert(self) -> Self {
        match self {
            Verdict::Match => Verdict::Nomatch,
            Verdict::Nomatch => Verdict::Match,
            Verdict::Neither => Verdict::Neither,
        }
    }
}

impl PatternTree {
    /// Evaluate `line` against the whole tree, from the root.
    pub fn evaluate(&self, line: &str) -> Verdict {
        self.eval_id(self.root(), line)
    }

    fn eval_id(&self, id: NodeId, line: &str) -> Verdict {
        let Ok(node) = self.node(id) else {
            return Verdict::Neither;
        };
        if !node.enabled {
            return Verdict::Neither;
        }
        match &node.op {
            Operator::Literal(pattern) => {
                if pattern.is_empty() || line.contains(pattern.as_str()) {
                    Verdict::Match
                } else {
                    Verdict::Nomatch
                }
            }
            Operator::Or => {
                let mut saw_nomatch = false;
                for &child in &node.children {
                    match self.eval_id(child, line) {
                        Verdict::Match => return Verdict::Match,
                        Verdict::Nomatch => saw_nomatch = true,
                        Verdict::Neither => {}
                    }
                }
                if saw_nomatch {
                    Verdict::Nomatch
                } else {
                    Verdict::Neither
                }
            }
            Operator::And => {
                let mut saw_match = false;
                for &child in &node.children {
                    match self.eval_id(child, line) {
                        Verdict::Nomatch => return Verdict::Nomatch,
                        Verdict::Match => saw_match = true,
                        Verdict::Neither => {}
                    }
                }
                if saw_match {
                    Verdict::Match
                } else {
                    Verdict::Neither
                }
            }
            // Only the first child counts.
            Operator::Not => match node.children.first() {
                Some(&child) => self.eval_id(child, line).invert(),
                None => Verdict::Neither,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(expr: &str) -> PatternTree {
        PatternTree::from_expression(expr).unwrap()
    }

    #[test]
    fn test_truth_table_and_not() {
        let tree = tree("&(lars,!(Dis))");

        assert_eq!(tree.evaluate("lars says hi"), Verdict::Match);
        assert_eq!(tree.evaluate("lars and Dis"), Verdict::Nomatch);
        assert_eq!(tree.evaluate("nothing relevant"), Verdict::Nomatch);

        assert!(tree.evaluate("lars says hi").is_visible());
        assert!(!tree.evaluate("lars and Dis").is_visible());
    }

    #[test]
    fn test_literal_substring() {
        let tree = tree("error");
        assert_eq!(tree.evaluate("an error occurred"), Verdict::Match);
        assert_eq!(tree.evaluate("all fine"), Verdict::Nomatch);
    }

    #[test]
    fn test_empty_literal_always_matches() {
        let mut tree = PatternTree::new();
        tree.insert_child(tree.root()).unwrap(); // new nodes start as empty literals
        assert_eq!(tree.evaluate("anything at all"), Verdict::Match);
    }

    #[test]
    fn test_or_short_circuit_and_nomatch() {
        let tree = tree("|(alpha,beta)");
        assert_eq!(tree.evaluate("has alpha"), Verdict::Match);
        assert_eq!(tree.evaluate("has beta"), Verdict::Match);
        assert_eq!(tree.evaluate("has neither"), Verdict::Nomatch);
    }

    #[test]
    fn test_and_requires_all() {
        let tree = tree("&(alpha,beta)");
        assert_eq!(tree.evaluate("alpha and beta"), Verdict::Match);
        assert_eq!(tree.evaluate("alpha only"), Verdict::Nomatch);
    }

    #[test]
    fn test_childless_combinators_are_neutral() {
        assert_eq!(tree("&()").evaluate("x"), Verdict::Match); // one empty literal child
        let empty_and = PatternTree::new();
        assert_eq!(empty_and.evaluate("x"), Verdict::Neither);
        let empty_not = PatternTree::with_root(Operator::Not);
        assert_eq!(empty_not.evaluate("x"), Verdict::Neither);
    }

    #[test]
    fn test_disabled_root_is_neither() {
        let mut tree = tree("&(lars)");
        let root = tree.root();
        tree.toggle_enabled(root).unwrap();
        assert_eq!(tree.evaluate("no lars here"), Verdict::Neither);
        assert!(tree.evaluate("no lars here").is_visible());
    }

    #[test]
    fn test_disabled_subtree_is_transparent() {
        let mut tree = tree("&(lars)");
        let child = tree.children(tree.root()).unwrap()[0];
        tree.toggle_enabled(child).unwrap();

        // The only child is inert, so the AND has no opinion: every line
        // is displayed.
        assert_eq!(tree.evaluate("no lars here"), Verdict::Neither);
        assert_eq!(tree.evaluate("lars too"), Verdict::Neither);
        assert!(tree.evaluate("no lars here").is_visible());
    }

    #[test]
    fn test_disabled_branch_does_not_fail_and() {
        let mut tree = tree("&(keep,drop)");
        let children: Vec<_> = tree.children(tree.root()).unwrap().to_vec();
        tree.toggle_enabled(children[1]).unwrap();

        // "drop" no longer rejects lines that lack it.
        assert_eq!(tree.evaluate("keep this"), Verdict::Match);
    }

    #[test]
    fn test_disabled_branch_does_not_pass_or() {
        let mut tree = tree("|(alpha,beta)");
        let children: Vec<_> = tree.children(tree.root()).unwrap().to_vec();
        tree.toggle_enabled(children[0]).unwrap();

        assert_eq!(tree.evaluate("has alpha"), Verdict::Nomatch);
        assert_eq!(tree.evaluate("has beta"), Verdict::Match);
    }

    #[test]
    fn test_not_inverts_only_first_child() {
        let tree = tree("!(alpha,beta)");
        assert_eq!(tree.evaluate("has alpha"), Verdict::Nomatch);
        assert_eq!(tree.evaluate("has beta only"), Verdict::Match);
    }

    #[test]
    fn test_not_of_neither_is_neither() {
        let mut tree = tree("!(alpha)");
        let child = tree.children(tree.root()).unwrap()[0];
        tree.toggle_enabled(child).unwrap();
        assert_eq!(tree.evaluate("has alpha"), Verdict::Neither);
    }

    #[test]
    fn test_nested_combination() {
        let tree = tree("|(&(a,b),&(c,d))");
        assert_eq!(tree.evaluate("a with b"), Verdict::Match);
        assert_eq!(tree.evaluate("c with d"), Verdict::Match);
        assert_eq!(tree.evaluate("a with d"), Verdict::Nomatch);
    }

    #[test]
    fn test_invert() {
        assert_eq!(Verdict::Match.invert(), Verdict::Nomatch);
        assert_eq!(Verdict::Nomatch.invert(), Verdict::Match);
        assert_eq!(Verdict::Neither.invert(), Verdict::Neither);
    }
}
