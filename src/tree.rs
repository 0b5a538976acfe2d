//! Array-backed rooted phylogenies.
//!
//! Nodes are dense indices; parents, children, branch lengths and labels live
//! in parallel vectors. Trees are immutable once parsed: the sampler treats
//! them as configuration, built once and shared by every chain.

use thiserror::Error;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TreeError {
    #[error("unexpected character {found:?} at byte {at}")]
    Unexpected { found: char, at: usize },
    #[error("unexpected end of input")]
    UnexpectedEnd,
    #[error("invalid branch length {text:?} at byte {at}")]
    BadBranchLength { text: String, at: usize },
    #[error("trailing input after the closing semicolon")]
    TrailingInput,
}

/// A rooted phylogenetic tree.
///
/// `branch_lengths[node]` is the length of the edge above `node`; the root
/// carries zero. Tip indices follow their order of appearance in the Newick
/// input, which is also the order trait observations are supplied in.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    branch_lengths: Vec<f64>,
    labels: Vec<Option<String>>,
    root: usize,
}

impl Tree {
    /// Parse a Newick string, e.g. `"(A:1.0,(B:0.5,C:0.5):0.5);"`.
    ///
    /// Supported: nesting, node labels, branch lengths. Missing branch
    /// lengths default to zero.
    pub fn from_newick(text: &str) -> Result<Tree, TreeError> {
        Parser::new(text).parse()
    }

    pub fn n_nodes(&self) -> usize {
        self.parents.len()
    }

    pub fn n_tips(&self) -> usize {
        self.children.iter().filter(|c| c.is_empty()).count()
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn is_tip(&self, node: usize) -> bool {
        self.children[node].is_empty()
    }

    pub fn parent(&self, node: usize) -> Option<usize> {
        self.parents[node]
    }

    pub fn children(&self, node: usize) -> &[usize] {
        &self.children[node]
    }

    pub fn branch_length(&self, node: usize) -> f64 {
        self.branch_lengths[node]
    }

    pub fn label(&self, node: usize) -> Option<&str> {
        self.labels[node].as_deref()
    }

    /// Tip indices in order of appearance.
    pub fn tips(&self) -> Vec<usize> {
        (0..self.n_nodes()).filter(|&n| self.is_tip(n)).collect()
    }

    /// Every node before its parent.
    pub fn postorder(&self) -> Vec<usize> {
        let mut order = self.preorder();
        order.reverse();
        order
    }

    /// Every node after its parent.
    pub fn preorder(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n_nodes());
        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            order.push(node);
            stack.extend_from_slice(&self.children[node]);
        }
        order
    }
}

struct Parser<'a> {
    bytes: &'a [u8],
    pos: usize,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    branch_lengths: Vec<f64>,
    labels: Vec<Option<String>>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Parser {
            bytes: text.as_bytes(),
            pos: 0,
            parents: Vec::new(),
            children: Vec::new(),
            branch_lengths: Vec::new(),
            labels: Vec::new(),
        }
    }

    fn parse(mut self) -> Result<Tree, TreeError> {
        self.skip_whitespace();
        let root = self.subtree(None)?;
        self.expect(b';')?;
        self.skip_whitespace();
        if self.pos != self.bytes.len() {
            return Err(TreeError::TrailingInput);
        }
        Ok(Tree {
            parents: self.parents,
            children: self.children,
            branch_lengths: self.branch_lengths,
            labels: self.labels,
            root,
        })
    }

    fn subtree(&mut self, parent: Option<usize>) -> Result<usize, TreeError> {
        let node = self.new_node(parent);
        if self.peek() == Some(b'(') {
            self.pos += 1;
            loop {
                self.subtree(Some(node))?;
                match self.peek() {
                    Some(b',') => self.pos += 1,
                    Some(b')') => {
                        self.pos += 1;
                        break;
                    }
                    Some(other) => {
                        return Err(TreeError::Unexpected {
                            found: other as char,
                            at: self.pos,
                        })
                    }
                    None => return Err(TreeError::UnexpectedEnd),
                }
            }
        }
        let label = self.take_label();
        if !label.is_empty() {
            self.labels[node] = Some(label);
        }
        if self.peek() == Some(b':') {
            self.pos += 1;
            self.branch_lengths[node] = self.take_branch_length()?;
        }
        Ok(node)
    }

    fn new_node(&mut self, parent: Option<usize>) -> usize {
        let node = self.parents.len();
        self.parents.push(parent);
        self.children.push(Vec::new());
        self.branch_lengths.push(0.);
        self.labels.push(None);
        if let Some(parent) = parent {
            self.children[parent].push(node);
        }
        node
    }

    fn take_label(&mut self) -> String {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if matches!(byte, b'(' | b')' | b',' | b':' | b';') {
                break;
            }
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos])
            .trim()
            .to_string()
    }

    fn take_branch_length(&mut self) -> Result<f64, TreeError> {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            if matches!(byte, b'0'..=b'9' | b'.' | b'e' | b'E' | b'+' | b'-') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = std::str::from_utf8(&self.bytes[start..self.pos]).expect("ascii span");
        let bad = |text: &str| TreeError::BadBranchLength {
            text: text.to_string(),
            at: start,
        };
        let length: f64 = text.parse().map_err(|_| bad(text))?;
        if !length.is_finite() || length < 0. {
            return Err(bad(text));
        }
        Ok(length)
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), TreeError> {
        match self.peek() {
            Some(found) if found == byte => {
                self.pos += 1;
                Ok(())
            }
            Some(found) => Err(TreeError::Unexpected {
                found: found as char,
                at: self.pos,
            }),
            None => Err(TreeError::UnexpectedEnd),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }
}
