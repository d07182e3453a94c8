//! Parse tree produced by the table-driven parser
//!
//! Every node owns its children. Interior nodes are tagged with the
//! non-terminal they were expanded from; leaves carry the matched token's
//! lexeme. A λ expansion is recorded as a single [`NodeTag::Empty`] child.

use std::fmt;

use super::grammar::NonTerminal;
use super::lexer::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeTag {
    NonTerminal(NonTerminal),
    Terminal(TokenKind),
    /// λ
    Empty,
}

impl fmt::Display for NodeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeTag::NonTerminal(nt) => write!(f, "{}", nt),
            NodeTag::Terminal(kind) => write!(f, "{}", kind),
            NodeTag::Empty => f.write_str("λ"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseTreeNode {
    pub tag: NodeTag,
    /// Lexeme, for terminal leaves only
    pub value: Option<String>,
    pub line: usize,
    pub children: Vec<ParseTreeNode>,
}

impl ParseTreeNode {
    pub fn interior(nt: NonTerminal, line: usize) -> Self {
        ParseTreeNode {
            tag: NodeTag::NonTerminal(nt),
            value: None,
            line,
            children: Vec::new(),
        }
    }

    pub fn leaf(kind: TokenKind, lexeme: impl Into<String>, line: usize) -> Self {
        ParseTreeNode {
            tag: NodeTag::Terminal(kind),
            value: Some(lexeme.into()),
            line,
            children: Vec::new(),
        }
    }

    pub fn empty(line: usize) -> Self {
        ParseTreeNode {
            tag: NodeTag::Empty,
            value: None,
            line,
            children: Vec::new(),
        }
    }

    pub fn nonterminal(&self) -> Option<NonTerminal> {
        match self.tag {
            NodeTag::NonTerminal(nt) => Some(nt),
            _ => None,
        }
    }

    pub fn token_kind(&self) -> Option<TokenKind> {
        match self.tag {
            NodeTag::Terminal(kind) => Some(kind),
            _ => None,
        }
    }

    /// True for a non-terminal that expanded to λ.
    pub fn is_lambda(&self) -> bool {
        matches!(self.children.as_slice(), [only] if only.tag == NodeTag::Empty)
    }

    /// Terminal leaves in source order (λ markers excluded).
    pub fn leaves(&self) -> Vec<&ParseTreeNode> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a ParseTreeNode>) {
        match self.tag {
            NodeTag::Terminal(_) => out.push(self),
            NodeTag::Empty => {}
            NodeTag::NonTerminal(_) => {
                for child in &self.children {
                    child.collect_leaves(out);
                }
            }
        }
    }

    /// Total number of nodes in this subtree
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(ParseTreeNode::size).sum::<usize>()
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, level: usize) -> fmt::Result {
        write!(f, "{}{}", "  ".repeat(level), self.tag)?;
        if let Some(value) = &self.value {
            write!(f, ":{}", value)?;
        }
        writeln!(f, " (Line {})", self.line)?;
        for child in &self.children {
            child.write_indented(f, level + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for ParseTreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaves_skip_lambda() {
        let mut root = ParseTreeNode::interior(NonTerminal::Statement, 1);
        root.children.push(ParseTreeNode::leaf(TokenKind::Id, "x", 1));
        let mut tail = ParseTreeNode::interior(NonTerminal::ServeTail, 1);
        tail.children.push(ParseTreeNode::empty(1));
        root.children.push(tail);
        root.children.push(ParseTreeNode::leaf(TokenKind::Semicolon, ";", 2));

        let lexemes: Vec<_> = root
            .leaves()
            .iter()
            .filter_map(|leaf| leaf.value.as_deref())
            .collect();
        assert_eq!(lexemes, vec!["x", ";"]);
        assert!(root.children[1].is_lambda());
        assert_eq!(root.size(), 5);
    }

    #[test]
    fn test_display_indents_children() {
        let mut root = ParseTreeNode::interior(NonTerminal::UnaryOp, 4);
        root.children.push(ParseTreeNode::leaf(TokenKind::PlusPlus, "++", 4));

        assert_eq!(root.to_string(), "<unary_op> (Line 4)\n  ++:++ (Line 4)\n");
    }
}
