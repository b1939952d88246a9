//! Search tree node types.
//!
//! Nodes are private to one move decision. Everything worth keeping
//! between decisions lives in the shared position record a node points
//! to, so the node itself only carries tree structure.

use uct_core::Player;

use crate::heuristics::Average;
use crate::store::RecordId;

/// Index into the node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct SearchNode<M> {
    /// Move that led to this node (None for root).
    pub mv: Option<M>,

    /// Player to move at this node.
    pub player: Player,

    /// Fingerprint of the position after `mv`.
    pub fingerprint: u64,

    /// Shared statistics for the position.
    pub record: RecordId,

    /// Child nodes in move generation order.
    pub children: Vec<NodeId>,

    /// Whether children have been generated.
    pub expanded: bool,

    /// Whether the position has no legal moves.
    pub terminal: bool,

    /// Whether a simulation has already passed through this node.
    pub simulated: bool,

    /// All-moves-as-first credit for `mv`, from the parent's point of view.
    pub amaf: Average,
}

impl<M> SearchNode<M> {
    /// Create a new unexpanded node.
    pub fn new(mv: Option<M>, player: Player, fingerprint: u64, record: RecordId) -> Self {
        Self {
            mv,
            player,
            fingerprint,
            record,
            children: Vec::new(),
            expanded: false,
            terminal: false,
            simulated: false,
            amaf: Average::default(),
        }
    }
}
