//! Constituency tree data structures
//!
//! A tree is stored as a flat node arena in preorder (the root has id 0 and
//! every subtree occupies a contiguous id range). Spans, node kinds and the
//! derived word/tag views are computed once when the tree is built and never
//! change afterwards.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Unique identifier for a node (index into the tree's arena)
pub type NodeId = usize;

/// Half-open interval `[start, end)` over word positions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of words covered
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// True if `other` lies inside this span (equal spans contain each other)
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if the two spans partially overlap: neither nested, disjoint nor equal
    pub fn crosses(&self, other: &Span) -> bool {
        (self.start < other.start && other.start < self.end && self.end < other.end)
            || (other.start < self.start && self.start < other.end && other.end < self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.start, self.end)
    }
}

/// Classification of a node, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Leaf: carries a surface word
    Terminal,
    /// Exactly one child, and that child is a terminal
    Pos,
    /// Any other internal node; the unit of bracket matching
    Label,
}

/// A node in a constituency tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Word for terminals, constituent or POS tag otherwise
    pub label: String,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
    pub span: Span,
    pub kind: NodeKind,
}

impl Node {
    fn new(id: NodeId, label: &str, parent: Option<NodeId>) -> Self {
        Self {
            id,
            label: label.to_string(),
            children: Vec::new(),
            parent,
            span: Span::default(),
            kind: NodeKind::Terminal,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn is_pos(&self) -> bool {
        self.kind == NodeKind::Pos
    }

    pub fn is_label(&self) -> bool {
        self.kind == NodeKind::Label
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.label, self.span)
    }
}

/// A labeled bracket: the identity used when matching constituents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bracket<'a> {
    pub label: &'a str,
    pub span: Span,
}

/// Error assembling a tree in a [`TreeBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {id} has not been added")]
    UnknownNode { id: NodeId },

    #[error("node {id} already has a parent")]
    SharedChild { id: NodeId },
}

/// Incremental construction of a tree from leaves upward
///
/// A node's children must already be in the builder and must not belong to
/// another node, so whatever is built is a tree. Ids handed out here are
/// builder-local; [`TreeBuilder::build`] renumbers the nodes into preorder.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    labels: Vec<String>,
    children: Vec<Vec<NodeId>>,
    attached: Vec<bool>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, label: &str, children: Vec<NodeId>) -> NodeId {
        let id = self.labels.len();
        self.labels.push(label.trim().to_string());
        self.children.push(children);
        self.attached.push(false);
        id
    }

    /// Add a terminal node
    pub fn leaf(&mut self, word: &str) -> NodeId {
        self.push(word, Vec::new())
    }

    /// Add an internal node over previously added, unattached nodes
    pub fn node(&mut self, label: &str, children: Vec<NodeId>) -> Result<NodeId, TreeError> {
        for (i, &child) in children.iter().enumerate() {
            if child >= self.len() {
                return Err(TreeError::UnknownNode { id: child });
            }
            if self.attached[child] || children[..i].contains(&child) {
                return Err(TreeError::SharedChild { id: child });
            }
        }
        for &child in &children {
            self.attached[child] = true;
        }
        Ok(self.push(label, children))
    }

    /// Number of nodes added so far
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Finish the tree rooted at `root`
    ///
    /// Nodes outside `root`'s subtree are dropped.
    pub fn build(self, root: NodeId) -> Result<Tree, TreeError> {
        if root >= self.len() {
            return Err(TreeError::UnknownNode { id: root });
        }
        let nodes = preorder(root, |id| (&self.labels[id], &self.children[id]));
        Ok(Tree::from_arena(nodes))
    }
}

/// Copy the subtree under `root` into a fresh preorder arena
///
/// Walks with an explicit stack, so arbitrarily deep trees are fine.
fn preorder<'a, F>(root: NodeId, lookup: F) -> Vec<Node>
where
    F: Fn(NodeId) -> (&'a String, &'a Vec<NodeId>),
{
    let mut nodes: Vec<Node> = Vec::new();
    let mut stack = vec![(root, None)];

    while let Some((source, parent)) = stack.pop() {
        let id = nodes.len();
        let (label, children) = lookup(source);
        nodes.push(Node::new(id, label, parent));
        if let Some(parent) = parent {
            nodes[parent].children.push(id);
        }
        // Reverse push so the leftmost child is visited next
        for &child in children.iter().rev() {
            stack.push((child, Some(id)));
        }
    }

    nodes
}

#[derive(Debug, Clone)]
struct TreeData {
    nodes: Vec<Node>,
    terminals: Vec<NodeId>,
    non_terminals: Vec<NodeId>,
    labels: Vec<NodeId>,
    pos_nodes: Vec<NodeId>,
    depth: usize,
    words: Vec<String>,
    tags: Vec<String>,
    pos_sentence: Vec<String>,
}

/// A constituency tree (sentence)
///
/// Cloning a `Tree` (or calling [`Tree::share`]) yields a read-only view of
/// the same allocation. [`Tree::deep_copy`] and [`Tree::subtree`] produce a
/// tree that exclusively owns freshly allocated nodes.
#[derive(Debug, Clone)]
pub struct Tree {
    data: Arc<TreeData>,
}

impl Tree {
    /// Classify nodes, assign spans and derive the cached views
    ///
    /// `nodes` must be in preorder with the root at index 0.
    fn from_arena(mut nodes: Vec<Node>) -> Self {
        // Terminals get consecutive positions in reading order; preorder
        // visits leaves left to right.
        let mut pos = 0;
        for node in nodes.iter_mut().filter(|n| n.is_leaf()) {
            node.span = Span::new(pos, pos + 1);
            pos += 1;
        }

        // Children always have larger ids than their parent, so a reverse
        // sweep sees every child before the node itself.
        let mut depths = vec![0usize; nodes.len()];
        for id in (0..nodes.len()).rev() {
            let (Some(&first), Some(&last)) = (nodes[id].children.first(), nodes[id].children.last())
            else {
                continue;
            };
            let span = Span::new(nodes[first].span.start, nodes[last].span.end);
            let kind = if nodes[id].children.len() == 1 && nodes[first].is_leaf() {
                NodeKind::Pos
            } else {
                NodeKind::Label
            };
            let deepest = nodes[id].children.iter().map(|&c| depths[c]).max();
            depths[id] = 1 + deepest.unwrap_or(0);

            let node = &mut nodes[id];
            node.span = span;
            node.kind = kind;
        }

        let ids_where = |pred: fn(&Node) -> bool| -> Vec<NodeId> {
            nodes.iter().filter(|n| pred(n)).map(|n| n.id).collect()
        };
        let terminals = ids_where(|n| n.is_leaf());
        let non_terminals = ids_where(|n| !n.is_leaf());
        let labels = ids_where(|n| n.is_label());
        let pos_nodes = ids_where(|n| n.is_pos());

        let words: Vec<String> = terminals.iter().map(|&id| nodes[id].label.clone()).collect();
        // A terminal's tag is the label directly above it. For well-formed
        // treebank input that is always a POS node.
        let tags: Vec<String> = terminals
            .iter()
            .map(|&id| {
                nodes[id]
                    .parent
                    .map(|p| nodes[p].label.clone())
                    .unwrap_or_default()
            })
            .collect();
        let pos_sentence = words
            .iter()
            .zip(&tags)
            .map(|(word, tag)| format!("{}_{}", word, tag))
            .collect();

        let depth = depths.first().copied().unwrap_or(0);

        Self {
            data: Arc::new(TreeData {
                nodes,
                terminals,
                non_terminals,
                labels,
                pos_nodes,
                depth,
                words,
                tags,
                pos_sentence,
            }),
        }
    }

    /// A read-only view sharing this tree's nodes
    pub fn share(&self) -> Self {
        self.clone()
    }

    /// A tree owning its own copy of every node
    pub fn deep_copy(&self) -> Self {
        Self {
            data: Arc::new((*self.data).clone()),
        }
    }

    /// A new tree built from a copy of the subtree rooted at `id`
    ///
    /// Spans are recomputed, so the new root starts at position 0.
    pub fn subtree(&self, id: NodeId) -> Option<Self> {
        let nodes = &self.data.nodes;
        nodes.get(id)?;
        let copied = preorder(id, |n| (&nodes[n].label, &nodes[n].children));
        Some(Self::from_arena(copied))
    }

    /// True if both trees view the same node allocation
    pub fn ptr_eq(&self, other: &Tree) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    pub fn root(&self) -> &Node {
        &self.data.nodes[0]
    }

    /// Get a node by ID
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.data.nodes.get(id)
    }

    /// All nodes in preorder
    pub fn nodes(&self) -> &[Node] {
        &self.data.nodes
    }

    /// Get the children of a node
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &Node> + '_ {
        self.get_node(id)
            .into_iter()
            .flat_map(move |node| node.children.iter().map(move |&c| &self.data.nodes[c]))
    }

    fn select<'a>(&'a self, ids: &'a [NodeId]) -> impl Iterator<Item = &'a Node> + 'a {
        ids.iter().map(move |&id| &self.data.nodes[id])
    }

    /// Leaves in reading order
    pub fn terminals(&self) -> impl Iterator<Item = &Node> + '_ {
        self.select(&self.data.terminals)
    }

    /// Internal nodes (POS and label nodes) in preorder
    pub fn non_terminals(&self) -> impl Iterator<Item = &Node> + '_ {
        self.select(&self.data.non_terminals)
    }

    /// Internal nodes that are not POS nodes, in preorder
    pub fn labels(&self) -> impl Iterator<Item = &Node> + '_ {
        self.select(&self.data.labels)
    }

    pub fn pos_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.select(&self.data.pos_nodes)
    }

    /// Labeled brackets of every label node, in preorder
    pub fn brackets(&self) -> impl Iterator<Item = Bracket<'_>> + '_ {
        self.labels().map(|node| Bracket {
            label: &node.label,
            span: node.span,
        })
    }

    pub fn label_count(&self) -> usize {
        self.data.labels.len()
    }

    /// Longest root-to-leaf path, counted in edges
    pub fn depth(&self) -> usize {
        self.data.depth
    }

    pub fn words(&self) -> &[String] {
        &self.data.words
    }

    /// Tags aligned positionally with [`Tree::words`]
    pub fn tags(&self) -> &[String] {
        &self.data.tags
    }

    /// `word_TAG` items aligned with [`Tree::words`]
    pub fn pos_sentence(&self) -> &[String] {
        &self.data.pos_sentence
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.data.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.words.is_empty()
    }

    /// Bracket notation of the subtree at `id`, spans omitted
    pub fn render(&self, id: NodeId) -> String {
        enum Step {
            Enter(NodeId),
            Space,
            Close,
        }

        let mut out = String::new();
        let mut stack = vec![Step::Enter(id)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Space => out.push(' '),
                Step::Close => out.push(')'),
                Step::Enter(id) => {
                    let Some(node) = self.get_node(id) else {
                        continue;
                    };
                    if node.is_leaf() {
                        out.push_str(&node.label);
                        continue;
                    }
                    out.push('(');
                    out.push_str(&node.label);
                    stack.push(Step::Close);
                    for &child in node.children.iter().rev() {
                        stack.push(Step::Enter(child));
                        stack.push(Step::Space);
                    }
                }
            }
        }
        out
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(0))
    }
}

/// Structural equality: same rendered bracket string
impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.render(0) == other.render(0)
    }
}

impl Eq for Tree {}

#[cfg(test)]
mod tests {
    use super::*;

    /// (IP (VP 这是) (NP (NN 一个) (NN 测试)))
    fn create_test_tree() -> Tree {
        let mut builder = TreeBuilder::new();
        let w0 = builder.leaf("这是");
        let vp = builder.node("VP", vec![w0]).unwrap();
        let w1 = builder.leaf("一个");
        let nn1 = builder.node("NN", vec![w1]).unwrap();
        let w2 = builder.leaf("测试");
        let nn2 = builder.node("NN", vec![w2]).unwrap();
        let np = builder.node("NP", vec![nn1, nn2]).unwrap();
        let ip = builder.node("IP", vec![vp, np]).unwrap();
        builder.build(ip).unwrap()
    }

    fn described<'a>(nodes: impl Iterator<Item = &'a Node>) -> Vec<String> {
        nodes.map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_tree_creation() {
        let tree = create_test_tree();

        assert_eq!(tree.nodes().len(), 8);
        assert_eq!(tree.root().label, "IP");
        assert_eq!(tree.root().parent, None);
        assert_eq!(tree.children(0).count(), 2);
        assert_eq!(tree.to_string(), "(IP (VP 这是) (NP (NN 一个) (NN 测试)))");
    }

    #[test]
    fn test_node_views() {
        let tree = create_test_tree();

        assert_eq!(
            described(tree.terminals()),
            vec!["这是(0,1)", "一个(1,2)", "测试(2,3)"]
        );
        assert_eq!(
            described(tree.non_terminals()),
            vec!["IP(0,3)", "VP(0,1)", "NP(1,3)", "NN(1,2)", "NN(2,3)"]
        );
        assert_eq!(described(tree.labels()), vec!["IP(0,3)", "NP(1,3)"]);
        assert_eq!(described(tree.pos_nodes()), vec!["VP(0,1)", "NN(1,2)", "NN(2,3)"]);
    }

    #[test]
    fn test_words_and_tags() {
        let tree = create_test_tree();

        assert_eq!(tree.words(), ["这是", "一个", "测试"]);
        assert_eq!(tree.tags(), ["VP", "NN", "NN"]);
        assert_eq!(tree.pos_sentence(), ["这是_VP", "一个_NN", "测试_NN"]);
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_depth() {
        let tree = create_test_tree();
        assert_eq!(tree.depth(), 3);

        let mut builder = TreeBuilder::new();
        let word = builder.leaf("word");
        let pos = builder.node("NN", vec![word]).unwrap();
        assert_eq!(builder.build(pos).unwrap().depth(), 1);
    }

    #[test]
    fn test_span_invariants() {
        let tree = create_test_tree();

        for node in tree.nodes() {
            if node.is_leaf() {
                assert_eq!(node.span.len(), 1);
                continue;
            }
            let first = &tree.nodes()[node.children[0]];
            let last = &tree.nodes()[*node.children.last().unwrap()];
            assert_eq!(node.span.start, first.span.start);
            assert_eq!(node.span.end, last.span.end);

            let spans: Vec<Span> = tree.children(node.id).map(|c| c.span).collect();
            for pair in spans.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
        }
        assert_eq!(tree.root().span, Span::new(0, tree.len()));
    }

    #[test]
    fn test_share_and_deep_copy() {
        let tree = create_test_tree();
        let shared = tree.share();
        let copied = tree.deep_copy();

        assert!(tree.ptr_eq(&shared));
        assert!(!tree.ptr_eq(&copied));
        assert_eq!(tree, copied);
        assert_eq!(copied.words(), tree.words());
    }

    #[test]
    fn test_subtree_restarts_spans() {
        let tree = create_test_tree();
        let np = tree.labels().find(|n| n.label == "NP").unwrap().id;
        let sub = tree.subtree(np).unwrap();

        assert_eq!(sub.to_string(), "(NP (NN 一个) (NN 测试))");
        assert_eq!(sub.root().span, Span::new(0, 2));
        assert_eq!(sub.words(), ["一个", "测试"]);
        // The source tree is untouched
        assert_eq!(tree.nodes()[np].span, Span::new(1, 3));
        assert!(tree.subtree(tree.nodes().len()).is_none());
    }

    #[test]
    fn test_builder_rejects_unknown_child() {
        let mut builder = TreeBuilder::new();
        let a = builder.leaf("a");
        assert_eq!(
            builder.node("NP", vec![a, 5]),
            Err(TreeError::UnknownNode { id: 5 })
        );
        // A node cannot name itself or a later node as its child
        assert_eq!(
            builder.node("NP", vec![builder.len()]),
            Err(TreeError::UnknownNode { id: 1 })
        );
        assert_eq!(builder.build(7).unwrap_err(), TreeError::UnknownNode { id: 7 });
    }

    #[test]
    fn test_builder_rejects_shared_child() {
        let mut builder = TreeBuilder::new();
        let a = builder.leaf("a");
        let b = builder.leaf("b");
        assert_eq!(
            builder.node("NP", vec![a, a]),
            Err(TreeError::SharedChild { id: a })
        );

        let np = builder.node("NP", vec![a, b]).unwrap();
        assert_eq!(
            builder.node("VP", vec![b]),
            Err(TreeError::SharedChild { id: b })
        );
        // A failed call leaves nothing attached
        assert!(builder.node("S", vec![np]).is_ok());
    }

    #[test]
    fn test_bare_terminal_under_phrase() {
        let mut builder = TreeBuilder::new();
        let a = builder.leaf("a");
        let b = builder.leaf("b");
        let nn = builder.node("NN", vec![b]).unwrap();
        let np = builder.node("NP", vec![a, nn]).unwrap();
        let tree = builder.build(np).unwrap();

        assert_eq!(tree.to_string(), "(NP a (NN b))");
        assert_eq!(tree.words(), ["a", "b"]);
        assert_eq!(tree.tags(), ["NP", "NN"]);
        assert_eq!(tree.label_count(), 1);
    }

    #[test]
    fn test_span_crossing() {
        let a = Span::new(0, 2);
        let b = Span::new(1, 3);
        assert!(a.crosses(&b));
        assert!(b.crosses(&a));

        // Nested, equal and disjoint spans never cross
        assert!(!Span::new(0, 3).crosses(&Span::new(1, 2)));
        assert!(!a.crosses(&a));
        assert!(!Span::new(0, 1).crosses(&Span::new(1, 2)));
        // Shared boundary is nesting, not crossing
        assert!(!Span::new(0, 2).crosses(&Span::new(0, 3)));
    }

    #[test]
    fn test_brackets() {
        let tree = create_test_tree();
        let brackets: Vec<Bracket> = tree.brackets().collect();

        assert_eq!(
            brackets,
            vec![
                Bracket { label: "IP", span: Span::new(0, 3) },
                Bracket { label: "NP", span: Span::new(1, 3) },
            ]
        );
    }
}
