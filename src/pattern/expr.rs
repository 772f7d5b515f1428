//! Pattern expression codec.
//!
//! The persisted form of a tree is a parenthesized expression such as
//! `|(lars,!(Dis))`: `&`, `|`, `!` mark And/Or/Not, commas separate
//! siblings, and anything else up to a `,` or `)` is a literal taken
//! verbatim (the format has no escaping). Enabled flags are not part of the
//! persisted shape; every deserialized node starts enabled.

use super::{Node, NodeId, Operator, PatternTree};
use std::fmt;

/// Expression parse error with byte position for caller-facing messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExprError {
    pub message: String,
    pub position: usize,
}

impl fmt::Display for ExprError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at position {}", self.message, self.position)
    }
}

impl std::error::Error for ExprError {}

impl PatternTree {
    /// Parse an expression into a tree.
    pub fn from_expression(input: &str) -> Result<Self, ExprError> {
        let mut parser = ExprParser { input, pos: 0 };
        let mut nodes = Vec::new();
        let root = parser.parse_node(&mut nodes, None)?;
        if parser.pos != input.len() {
            return Err(ExprError {
                message: "unexpected trailing characters".to_string(),
                position: parser.pos,
            });
        }
        Ok(PatternTree { nodes, root })
    }

    /// Serialize the tree back to its expression form.
    pub fn to_expression(&self) -> String {
        let mut out = String::new();
        self.write_node(self.root(), &mut out);
        out
    }

    fn write_node(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        let marker = match &node.op {
            Operator::Literal(pattern) => {
                out.push_str(pattern);
                return;
            }
            Operator::And => '&',
            Operator::Or => '|',
            Operator::Not => '!',
        };
        out.push(marker);
        out.push('(');
        for (i, &child) in node.children.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            self.write_node(child, out);
        }
        out.push(')');
    }
}

struct ExprParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// node := ('&' | '|' | '!') '(' node (',' node)* ')' | literal
    fn parse_node(
        &mut self,
        nodes: &mut Vec<Option<Node>>,
        parent: Option<NodeId>,
    ) -> Result<NodeId, ExprError> {
        let rest = &self.input[self.pos..];
        let mut lookahead = rest.chars();
        let combinator = match (lookahead.next(), lookahead.next()) {
            (Some('&'), Some('(')) => Some(Operator::And),
            (Some('|'), Some('(')) => Some(Operator::Or),
            (Some('!'), Some('(')) => Some(Operator::Not),
            _ => None,
        };

        match combinator {
            Some(op) => {
                self.pos += 2;
                let id = NodeId(nodes.len());
                nodes.push(Some(Node {
                    op,
                    enabled: true,
                    parent,
                    children: Vec::new(),
                }));
                loop {
                    let child = self.parse_node(nodes, Some(id))?;
                    if let Some(Some(node)) = nodes.get_mut(id.0) {
                        node.children.push(child);
                    }
                    match self.peek() {
                        Some(',') => self.pos += 1,
                        Some(')') => {
                            self.pos += 1;
                            break;
                        }
                        _ => {
                            return Err(ExprError {
                                message: "expected ',' or ')'".to_string(),
                                position: self.pos,
                            })
                        }
                    }
                }
                Ok(id)
            }
            None => {
                // Literal: everything up to the next ',' or ')', verbatim.
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c == ',' || c == ')' {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                let id = NodeId(nodes.len());
                nodes.push(Some(Node {
                    op: Operator::Literal(self.input[start..self.pos].to_string()),
                    enabled: true,
                    parent,
                    children: Vec::new(),
                }));
                Ok(id)
            }
        }
    }
}
