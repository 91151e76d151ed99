//! Factor graph over the spider parts.
//!
//! ```text
//!            ┌── 1 ── 5
//!            ├── 2 ── 6
//!   root 0 ──┼── 3 ── 7
//!            └── 4 ── 8
//! ```
//!
//! Topology is fixed. Each edge carries one potential and one message
//! slot per direction; nodes carry a mixture belief over their part
//! parameters.

use nalgebra::DVector;

use super::mixture::Mixture;
use super::potentials::{PairwisePotential, PotentialKind, PotentialNoise};
use crate::core::math::normalize_angle;
use crate::error::{Error, Result};
use crate::spider::{NUM_INNER, NUM_PARTS, PartLists};

/// Node index: 0 is the root, 1..=8 the links `l1`..`l8`.
pub type NodeId = usize;

/// Root node id.
pub const ROOT: NodeId = 0;

/// Default belief covariance for the root `[x, y, r]`.
pub const CIRCLE_COV: [f64; 3] = [2.0, 2.0, 2.0];
/// Default belief covariance for links `[x, y, theta, w, h]`.
pub const RECT_COV: [f64; 5] = [2.0, 2.0, 0.2, 2.0, 2.0];

/// Index of the heading in a link parameter vector.
pub const HEADING_AXIS: usize = 2;

/// Role of a node in the kinematic tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Circular body
    Root,
    /// Link attached to the root
    Inner,
    /// Link attached to an inner link
    Outer,
}

impl NodeKind {
    /// Kind of node `id`.
    pub fn of(id: NodeId) -> Self {
        match id {
            ROOT => NodeKind::Root,
            i if i <= NUM_INNER => NodeKind::Inner,
            _ => NodeKind::Outer,
        }
    }

    /// Dimension of the node's parameter vector.
    pub fn dim(&self) -> usize {
        match self {
            NodeKind::Root => 3,
            NodeKind::Inner | NodeKind::Outer => 5,
        }
    }

    /// Heading axis, for kinds that carry one.
    pub fn heading_axis(&self) -> Option<usize> {
        match self {
            NodeKind::Root => None,
            NodeKind::Inner | NodeKind::Outer => Some(HEADING_AXIS),
        }
    }

    /// Parameters as reported to callers, with the heading in [0, 2π).
    ///
    /// Internally headings stay unwrapped so products do not straddle
    /// the 0/2π seam.
    pub fn reported(&self, mean: &DVector<f64>) -> Vec<f64> {
        let mut params = mean.as_slice().to_vec();
        if let Some(axis) = self.heading_axis() {
            params[axis] = normalize_angle(params[axis]);
        }
        params
    }

    /// Default belief covariance diagonal.
    pub fn default_cov(&self) -> DVector<f64> {
        match self {
            NodeKind::Root => DVector::from_column_slice(&CIRCLE_COV),
            NodeKind::Inner | NodeKind::Outer => DVector::from_column_slice(&RECT_COV),
        }
    }
}

/// Graph node.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    belief: Mixture,
}

impl Node {
    /// Node id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Current belief.
    pub fn belief(&self) -> &Mixture {
        &self.belief
    }
}

/// Undirected edge `a ↔ b` with a potential and message per direction.
#[derive(Debug, Clone)]
pub struct Edge {
    a: NodeId,
    b: NodeId,
    psi_ab: PairwisePotential,
    psi_ba: PairwisePotential,
    msg_ab: Mixture,
    msg_ba: Mixture,
}

impl Edge {
    fn new(a: NodeId, b: NodeId, psi_ab: PairwisePotential, psi_ba: PairwisePotential) -> Self {
        Self {
            a,
            b,
            psi_ab,
            psi_ba,
            msg_ab: Mixture::new(NodeKind::of(b).dim()),
            msg_ba: Mixture::new(NodeKind::of(a).dim()),
        }
    }

    /// Endpoints `(a, b)`.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.a, self.b)
    }

    /// Whether `id` is an endpoint.
    pub fn touches(&self, id: NodeId) -> bool {
        self.a == id || self.b == id
    }

    /// The endpoint opposite `id`.
    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        if id == self.a {
            Some(self.b)
        } else if id == self.b {
            Some(self.a)
        } else {
            None
        }
    }

    /// Message travelling `from → to`.
    pub fn message(&self, from: NodeId, to: NodeId) -> Option<&Mixture> {
        match (from, to) {
            (f, t) if f == self.a && t == self.b => Some(&self.msg_ab),
            (f, t) if f == self.b && t == self.a => Some(&self.msg_ba),
            _ => None,
        }
    }

    /// Potential used to predict `to` from `from`.
    pub fn potential(&self, from: NodeId, to: NodeId) -> Option<&PairwisePotential> {
        match (from, to) {
            (f, t) if f == self.a && t == self.b => Some(&self.psi_ab),
            (f, t) if f == self.b && t == self.a => Some(&self.psi_ba),
            _ => None,
        }
    }

    fn message_mut(&mut self, from: NodeId, to: NodeId) -> Option<&mut Mixture> {
        match (from, to) {
            (f, t) if f == self.a && t == self.b => Some(&mut self.msg_ab),
            (f, t) if f == self.b && t == self.a => Some(&mut self.msg_ba),
            _ => None,
        }
    }
}

/// The spider factor graph.
#[derive(Debug, Clone)]
pub struct SpiderGraph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl Default for SpiderGraph {
    fn default() -> Self {
        Self::new(PotentialNoise::default())
    }
}

impl SpiderGraph {
    /// Build the fixed topology with empty beliefs and messages.
    pub fn new(noise: PotentialNoise) -> Self {
        let nodes = (0..NUM_PARTS)
            .map(|id| {
                let kind = NodeKind::of(id);
                Node {
                    id,
                    kind,
                    belief: Mixture::new(kind.dim()),
                }
            })
            .collect();

        let psi = |kind| PairwisePotential::new(kind, noise);
        let mut edges = Vec::with_capacity(2 * NUM_INNER);
        for i in 1..=NUM_INNER {
            edges.push(Edge::new(
                ROOT,
                i,
                psi(PotentialKind::RootToLink { joint: i - 1 }),
                psi(PotentialKind::LinkToRoot),
            ));
        }
        for i in 1..=NUM_INNER {
            edges.push(Edge::new(
                i,
                i + NUM_INNER,
                psi(PotentialKind::InnerToOuter),
                psi(PotentialKind::OuterToInner),
            ));
        }

        Self { nodes, edges }
    }

    /// All nodes, by id.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    fn node_checked(&self, id: NodeId) -> Result<&Node> {
        self.nodes
            .get(id)
            .ok_or_else(|| Error::InvalidParameter(format!("no node {}", id)))
    }

    fn edge_between(&self, a: NodeId, b: NodeId) -> Option<&Edge> {
        self.edges.iter().find(|e| e.touches(a) && e.other(a) == Some(b))
    }

    /// Belief of node `id`.
    pub fn belief(&self, id: NodeId) -> Result<&Mixture> {
        Ok(&self.node_checked(id)?.belief)
    }

    /// Replace the belief of node `id`.
    pub fn set_belief(&mut self, id: NodeId, belief: Mixture) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| Error::InvalidParameter(format!("no node {}", id)))?;
        Error::check_dim(node.kind.dim(), belief.dim(), "SpiderGraph::set_belief")?;
        node.belief = belief;
        Ok(())
    }

    /// Equal-weight belief around `means` with the node's default covariance.
    pub fn set_belief_from_means(&mut self, id: NodeId, means: &[DVector<f64>]) -> Result<()> {
        let kind = self.node_checked(id)?.kind;
        let belief = if means.is_empty() {
            Mixture::new(kind.dim())
        } else {
            Mixture::from_means(means, &kind.default_cov())?
        };
        self.set_belief(id, belief)
    }

    /// Neighbours of `id`.
    pub fn neighbours(&self, id: NodeId) -> Vec<NodeId> {
        self.edges.iter().filter_map(|e| e.other(id)).collect()
    }

    /// Non-empty messages into `id`, skipping the one from `exclude`.
    pub fn neighbour_msgs(&self, id: NodeId, exclude: Option<NodeId>) -> Vec<&Mixture> {
        self.edges
            .iter()
            .filter_map(|e| {
                let from = e.other(id)?;
                if Some(from) == exclude {
                    return None;
                }
                e.message(from, id)
            })
            .filter(|m| !m.is_empty())
            .collect()
    }

    /// Message `from → to`, if the nodes are adjacent.
    pub fn message(&self, from: NodeId, to: NodeId) -> Option<&Mixture> {
        self.edge_between(from, to)?.message(from, to)
    }

    /// Potential predicting `to` from `from`, if the nodes are adjacent.
    pub fn potential(&self, from: NodeId, to: NodeId) -> Option<&PairwisePotential> {
        self.edge_between(from, to)?.potential(from, to)
    }

    /// Store the message `from → to`.
    pub fn update_message(&mut self, from: NodeId, to: NodeId, msg: Mixture) -> Result<()> {
        let slot = self
            .edges
            .iter_mut()
            .find_map(|e| e.message_mut(from, to))
            .ok_or_else(|| Error::InvalidParameter(format!("no edge {} -> {}", from, to)))?;
        Error::check_dim(slot.dim(), msg.dim(), "SpiderGraph::update_message")?;
        *slot = msg;
        Ok(())
    }

    /// Drop every message.
    pub fn clear_messages(&mut self) {
        for e in &mut self.edges {
            e.msg_ab = Mixture::new(e.msg_ab.dim());
            e.msg_ba = Mixture::new(e.msg_ba.dim());
        }
    }

    /// Belief component means of every node.
    pub fn to_part_lists(&self) -> PartLists {
        let mut lists = PartLists::new();
        for node in &self.nodes {
            for mean in node.belief.means() {
                lists.push(node.id, node.kind().reported(&mean));
            }
        }
        lists
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::mixture::Gaussian;

    fn mean(v: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(v)
    }

    #[test]
    fn test_topology() {
        let g = SpiderGraph::default();
        assert_eq!(g.nodes().len(), 9);
        assert_eq!(g.edges().len(), 8);

        let mut root_nb = g.neighbours(ROOT);
        root_nb.sort();
        assert_eq!(root_nb, vec![1, 2, 3, 4]);

        let mut l2 = g.neighbours(2);
        l2.sort();
        assert_eq!(l2, vec![0, 6]);
        assert_eq!(g.neighbours(7), vec![3]);
    }

    #[test]
    fn test_node_kinds() {
        assert_eq!(NodeKind::of(0), NodeKind::Root);
        assert_eq!(NodeKind::of(4), NodeKind::Inner);
        assert_eq!(NodeKind::of(5), NodeKind::Outer);
        assert_eq!(NodeKind::of(3).default_cov().len(), 5);
        assert_eq!(NodeKind::Root.default_cov().as_slice(), &CIRCLE_COV);
        assert_eq!(NodeKind::Outer.default_cov().as_slice(), &RECT_COV);
    }

    #[test]
    fn test_potential_directions() {
        let g = SpiderGraph::default();
        assert_eq!(
            g.potential(ROOT, 3).map(|p| p.kind),
            Some(PotentialKind::RootToLink { joint: 2 })
        );
        assert_eq!(g.potential(3, ROOT).map(|p| p.kind), Some(PotentialKind::LinkToRoot));
        assert_eq!(g.potential(1, 5).map(|p| p.kind), Some(PotentialKind::InnerToOuter));
        assert_eq!(g.potential(5, 1).map(|p| p.kind), Some(PotentialKind::OuterToInner));
        assert!(g.potential(ROOT, 5).is_none());
    }

    #[test]
    fn test_messages_routed_by_direction() {
        let mut g = SpiderGraph::default();
        let msg = Mixture::from_means(&[mean(&[1.0, 2.0, 3.0])], &mean(&CIRCLE_COV)).unwrap();
        g.update_message(1, ROOT, msg.clone()).unwrap();

        assert_eq!(g.message(1, ROOT), Some(&msg));
        assert!(g.message(ROOT, 1).is_some_and(Mixture::is_empty));
        assert_eq!(g.neighbour_msgs(ROOT, None).len(), 1);
        assert!(g.neighbour_msgs(ROOT, Some(1)).is_empty());
        assert!(g.neighbour_msgs(1, None).is_empty());

        g.clear_messages();
        assert!(g.neighbour_msgs(ROOT, None).is_empty());
    }

    #[test]
    fn test_update_message_errors() {
        let mut g = SpiderGraph::default();
        let circle = Mixture::from_means(&[mean(&[1.0, 2.0, 3.0])], &mean(&CIRCLE_COV)).unwrap();
        assert!(matches!(
            g.update_message(ROOT, 5, circle.clone()),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            g.update_message(ROOT, 1, circle),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_beliefs_and_part_lists() {
        let mut g = SpiderGraph::default();
        g.set_belief_from_means(ROOT, &[mean(&[1.0, 2.0, 9.0]), mean(&[3.0, 4.0, 9.0])])
            .unwrap();
        g.set_belief_from_means(6, &[mean(&[1.0, 2.0, 0.0, 20.0, 5.0])]).unwrap();

        let root = g.belief(ROOT).unwrap();
        assert_eq!(root.len(), 2);
        assert_eq!(root.components()[0].cov().as_slice(), &CIRCLE_COV);
        assert_eq!(g.belief(6).unwrap().components()[0].cov().as_slice(), &RECT_COV);

        let lists = g.to_part_lists();
        assert_eq!(lists.get("circles").unwrap().len(), 2);
        assert_eq!(lists.get("l6").unwrap()[0], vec![1.0, 2.0, 0.0, 20.0, 5.0]);
        assert!(lists.get("l1").unwrap().is_empty());

        g.set_belief_from_means(2, &[mean(&[1.0, 2.0, -0.5, 20.0, 5.0])]).unwrap();
        let heading = g.to_part_lists().get("l2").unwrap()[0][2];
        assert!((heading - (std::f64::consts::TAU - 0.5)).abs() < 1e-12);

        let bad = Mixture::from_components(
            vec![Gaussian::from_slices(&[0.0], &[1.0]).unwrap()],
            vec![1.0],
        )
        .unwrap();
        assert!(g.set_belief(ROOT, bad).is_err());
        assert!(g.belief(42).is_err());
    }
}
