//! Arena-allocated search tree.
//!
//! Using a Vec<SearchNode> with indices provides better cache locality
//! and simpler ownership compared to Rc<RefCell<SearchNode>>.

use crate::node::{NodeId, SearchNode};

/// Arena-allocated search tree for one move decision.
#[derive(Debug)]
pub struct Tree<M> {
    nodes: Vec<SearchNode<M>>,
}

impl<M> Tree<M> {
    /// Create a tree holding only `root`.
    pub fn new(root: SearchNode<M>) -> Self {
        Self { nodes: vec![root] }
    }

    /// Get a reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get(&self, id: NodeId) -> &SearchNode<M> {
        &self.nodes[id.0]
    }

    /// Get a mutable reference to a node by ID.
    ///
    /// # Panics
    /// Panics if the NodeId is invalid.
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode<M> {
        &mut self.nodes[id.0]
    }

    /// Add a new node to the tree, returning its ID.
    pub fn add(&mut self, node: SearchNode<M>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Get the number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Get the root node.
    pub fn root(&self) -> &SearchNode<M> {
        self.get(NodeId::ROOT)
    }
}
