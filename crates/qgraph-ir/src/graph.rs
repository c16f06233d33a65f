//! Dependency graph of a recorded quantum circuit.
//!
//! A [`CircuitGraph`] owns the queue of operations and observables recorded
//! for a quantum function. Every queue entry becomes one node, and the node
//! index is the queue index. For every wire, each node is connected to the
//! next node in declaration order that acts on the same wire, so an edge
//! `a → b` means `b` must see the state produced by `a`.
//!
//! ```text
//! wire 0: RX(0) ──► CNOT(3) ──► CNOT(5) ──► ⟨X⟩(7)
//! wire 1: RY(1) ──┘    └──────► X(6) ─────► ⟨H⟩(8)
//! ```
//!
//! Edges only ever point forward in the queue, so the graph is acyclic and
//! the queue order is a valid topological order.

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex as PetNodeIndex};
use petgraph::visit::{Dfs, EdgeRef, IntoNeighbors, Reversed, Visitable};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::error::{IrError, IrResult};
use crate::observable::Observable;
use crate::operator::Operator;
use crate::wire::Wire;

/// Node index type for the circuit graph.
pub type NodeIndex = PetNodeIndex<u32>;

/// A queue entry: an operation or a terminal observable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CircuitNode {
    /// A gate or state preparation.
    Operation(Operator),
    /// A measurement.
    Observable(Observable),
}

impl CircuitNode {
    /// Wires this node acts on, in order.
    pub fn wires(&self) -> Vec<Wire> {
        match self {
            CircuitNode::Operation(op) => op.wires.clone(),
            CircuitNode::Observable(obs) => obs.wires(),
        }
    }

    /// Display name of the node.
    pub fn name(&self) -> String {
        match self {
            CircuitNode::Operation(op) => op.name().to_string(),
            CircuitNode::Observable(obs) => obs.name(),
        }
    }

    /// Check if this is an operation node.
    #[inline]
    pub fn is_operation(&self) -> bool {
        matches!(self, CircuitNode::Operation(_))
    }

    /// Check if this is an observable node.
    #[inline]
    pub fn is_observable(&self) -> bool {
        matches!(self, CircuitNode::Observable(_))
    }

    /// Get the operator if this is an operation node.
    #[inline]
    pub fn operation(&self) -> Option<&Operator> {
        match self {
            CircuitNode::Operation(op) => Some(op),
            CircuitNode::Observable(_) => None,
        }
    }

    /// Get the observable if this is an observable node.
    #[inline]
    pub fn observable(&self) -> Option<&Observable> {
        match self {
            CircuitNode::Observable(obs) => Some(obs),
            CircuitNode::Operation(_) => None,
        }
    }

    fn class_name(&self) -> &'static str {
        match self {
            CircuitNode::Operation(_) => "operation",
            CircuitNode::Observable(_) => "observable",
        }
    }
}

impl From<Operator> for CircuitNode {
    fn from(op: Operator) -> Self {
        CircuitNode::Operation(op)
    }
}

impl From<Observable> for CircuitNode {
    fn from(obs: Observable) -> Self {
        CircuitNode::Observable(obs)
    }
}

/// One use of a free variable: parameter `param_slot` of the operation at
/// queue index `op_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParameterDependency {
    /// Queue index of the operation.
    pub op_index: usize,
    /// Position of the parameter within the operation.
    pub param_slot: usize,
}

/// Map from free variable index to every parameter that depends on it.
pub type VariableDeps = BTreeMap<usize, Vec<ParameterDependency>>;

/// Derive the variable map of a queue from its parameter expressions.
pub fn variable_deps(queue: &[CircuitNode]) -> VariableDeps {
    let mut deps = VariableDeps::new();
    for (op_index, node) in queue.iter().enumerate() {
        let Some(op) = node.operation() else {
            continue;
        };
        for (param_slot, param) in op.params.iter().enumerate() {
            for variable in param.variables() {
                deps.entry(variable).or_default().push(ParameterDependency {
                    op_index,
                    param_slot,
                });
            }
        }
    }
    deps
}

/// A group of mutually independent operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    /// Queue indices of the operations, in declaration order.
    pub ops: Vec<usize>,
    /// Sorted indices of the free variables the operations depend on.
    pub param_indices: Vec<usize>,
}

/// A layer together with its surroundings in the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerView {
    /// All ancestors of the layer's operations, ordered.
    pub preceding: Vec<usize>,
    /// The layer's operations.
    pub ops: Vec<usize>,
    /// Sorted free variable indices of the layer.
    pub param_indices: Vec<usize>,
    /// All descendants of the layer's operations, ordered.
    pub following: Vec<usize>,
}

/// Directed acyclic dependency graph of a recorded circuit.
#[derive(Debug, Clone)]
pub struct CircuitGraph {
    /// The underlying graph. Edge weights are the sorted wires shared by
    /// the ends.
    graph: DiGraph<CircuitNode, Vec<Wire>, u32>,
    /// Per wire, the queue indices of nodes acting on it.
    grid: BTreeMap<Wire, Vec<usize>>,
    /// Free variable to parameter mapping.
    variable_deps: VariableDeps,
}

impl CircuitGraph {
    /// Build the graph for a queue of operations followed by observables.
    pub fn new(queue: impl IntoIterator<Item = CircuitNode>, variable_deps: VariableDeps) -> Self {
        let mut graph: DiGraph<CircuitNode, Vec<Wire>, u32> = DiGraph::default();
        let mut grid: BTreeMap<Wire, Vec<usize>> = BTreeMap::new();

        for node in queue {
            let wires = node.wires();
            let index = graph.add_node(node);

            for wire in wires {
                let on_wire = grid.entry(wire).or_default();
                if let Some(&prev) = on_wire.last() {
                    let prev = NodeIndex::new(prev);
                    match graph.find_edge(prev, index) {
                        Some(edge) => {
                            let shared = &mut graph[edge];
                            shared.push(wire);
                            shared.sort_unstable();
                        }
                        None => {
                            graph.add_edge(prev, index, vec![wire]);
                        }
                    }
                }
                on_wire.push(index.index());
            }
        }

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            wires = grid.len(),
            "built circuit graph"
        );

        Self {
            graph,
            grid,
            variable_deps,
        }
    }

    /// Build the graph, deriving the variable map from the parameters.
    pub fn from_queue(queue: impl IntoIterator<Item = CircuitNode>) -> Self {
        let queue: Vec<CircuitNode> = queue.into_iter().collect();
        let deps = variable_deps(&queue);
        Self::new(queue, deps)
    }

    /// Get the underlying petgraph graph.
    #[inline]
    pub fn graph(&self) -> &DiGraph<CircuitNode, Vec<Wire>, u32> {
        &self.graph
    }

    /// Get the variable map.
    #[inline]
    pub fn variable_deps(&self) -> &VariableDeps {
        &self.variable_deps
    }

    /// Number of free variables referenced, i.e. one past the largest index.
    pub fn num_variables(&self) -> usize {
        self.variable_deps
            .keys()
            .next_back()
            .map_or(0, |&max| max + 1)
    }

    /// Get the number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Get a node by queue index.
    #[inline]
    pub fn node(&self, index: usize) -> Option<&CircuitNode> {
        self.graph.node_weight(NodeIndex::new(index))
    }

    /// Iterate over all nodes in queue order.
    pub fn nodes(&self) -> impl Iterator<Item = &CircuitNode> {
        self.graph.node_weights()
    }

    /// All edges as `(source, target)` queue index pairs, sorted.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Wires shared along the edge `source → target`, sorted, if the edge
    /// exists.
    pub fn edge_wires(&self, source: usize, target: usize) -> Option<&[Wire]> {
        if source >= self.num_nodes() || target >= self.num_nodes() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(source), NodeIndex::new(target))
            .map(|e| self.graph[e].as_slice())
    }

    /// All wires used by the circuit, sorted.
    pub fn wires(&self) -> Vec<Wire> {
        self.grid.keys().copied().collect()
    }

    /// Operations in queue order.
    pub fn operations(&self) -> Vec<&Operator> {
        self.nodes().filter_map(CircuitNode::operation).collect()
    }

    /// Observables in queue order.
    pub fn observables(&self) -> Vec<&Observable> {
        self.nodes().filter_map(CircuitNode::observable).collect()
    }

    /// Queue indices of operations.
    pub fn operation_indices(&self) -> Vec<usize> {
        self.indices_where(CircuitNode::is_operation)
    }

    /// Queue indices of observables.
    pub fn observable_indices(&self) -> Vec<usize> {
        self.indices_where(CircuitNode::is_observable)
    }

    fn indices_where(&self, pred: impl Fn(&CircuitNode) -> bool) -> Vec<usize> {
        self.nodes()
            .enumerate()
            .filter(|(_, n)| pred(n))
            .map(|(i, _)| i)
            .collect()
    }

    /// Queue indices of the nodes acting on `wire`, in declaration order.
    ///
    /// Returns an empty slice for a wire the circuit never touches.
    pub fn wire_indices(&self, wire: impl Into<Wire>) -> &[usize] {
        self.grid
            .get(&wire.into())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All nodes from which any of `nodes` is reachable, excluding `nodes`.
    ///
    /// Indices outside the graph are ignored.
    pub fn ancestors(&self, nodes: &[usize]) -> BTreeSet<usize> {
        self.closure(nodes, Direction::Incoming)
    }

    /// All nodes reachable from any of `nodes`, excluding `nodes`.
    ///
    /// Indices outside the graph are ignored.
    pub fn descendants(&self, nodes: &[usize]) -> BTreeSet<usize> {
        self.closure(nodes, Direction::Outgoing)
    }

    fn closure(&self, nodes: &[usize], direction: Direction) -> BTreeSet<usize> {
        let starts: Vec<NodeIndex> = nodes
            .iter()
            .filter(|&&i| i < self.num_nodes())
            .map(|&i| NodeIndex::new(i))
            .collect();

        let mut found = match direction {
            Direction::Outgoing => reachable(&self.graph, &starts),
            Direction::Incoming => reachable(Reversed(&self.graph), &starts),
        };
        for index in nodes {
            found.remove(index);
        }
        found
    }

    /// Replace the node at `index` in place, keeping its edges.
    ///
    /// The replacement must be of the same class (operation or observable)
    /// and act on the same wires, otherwise the edges would no longer be
    /// valid.
    pub fn update_node(&mut self, index: usize, new: impl Into<CircuitNode>) -> IrResult<()> {
        let new = new.into();
        let current = self
            .graph
            .node_weight_mut(NodeIndex::new(index))
            .ok_or(IrError::InvalidNode(index))?;

        if current.class_name() != new.class_name() {
            return Err(IrError::NodeKindMismatch {
                index,
                expected: current.class_name(),
                got: new.class_name(),
            });
        }

        let (expected, got) = (current.wires(), new.wires());
        if expected != got {
            return Err(IrError::WireMismatch {
                index,
                expected,
                got,
            });
        }

        *current = new;
        Ok(())
    }

    /// Partition the operations into layers of mutually independent
    /// operations.
    ///
    /// Operations are visited in declaration order and appended to the
    /// current layer; a new layer starts as soon as an operation depends on
    /// an operation already in the current layer.
    pub fn layers(&self) -> Vec<Layer> {
        let layers: Vec<Layer> = self
            .layer_groups()
            .map(|ops| Layer {
                param_indices: self.param_indices(&ops),
                ops,
            })
            .collect();

        debug!(layers = layers.len(), "computed circuit layers");
        layers
    }

    /// Operation groups of [`CircuitGraph::layers`], built one at a time.
    fn layer_groups(&self) -> impl Iterator<Item = Vec<usize>> + '_ {
        let ops = self.operation_indices();
        let mut position = 0;
        std::iter::from_fn(move || {
            let mut current: Vec<usize> = Vec::new();
            while let Some(&index) = ops.get(position) {
                if !current.is_empty() {
                    let ancestors = self.ancestors(&[index]);
                    if current.iter().any(|op| ancestors.contains(op)) {
                        break;
                    }
                }
                current.push(index);
                position += 1;
            }
            (!current.is_empty()).then_some(current)
        })
    }

    /// Sorted free variable indices used by any of the given operations.
    fn param_indices(&self, ops: &[usize]) -> Vec<usize> {
        self.variable_deps
            .iter()
            .filter(|(_, uses)| uses.iter().any(|dep| ops.contains(&dep.op_index)))
            .map(|(&variable, _)| variable)
            .collect()
    }

    /// Lazily visit each layer with its ancestors and descendants.
    ///
    /// A layer is only grouped once the previous view has been consumed, so
    /// stopping early skips the remaining dependency walks.
    pub fn iterate_layers(&self) -> impl Iterator<Item = LayerView> + '_ {
        self.layer_groups().map(move |ops| LayerView {
            preceding: self.ancestors(&ops).into_iter().collect(),
            following: self.descendants(&ops).into_iter().collect(),
            param_indices: self.param_indices(&ops),
            ops,
        })
    }

    /// Calculate the circuit depth: the longest chain of dependent
    /// operations. Observables do not add to the depth.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.num_nodes()];
        let mut max_depth = 0;

        // Queue order is a topological order.
        for node in self.graph.node_indices() {
            let max_pred_depth = self
                .graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|pred| depths[pred.index()])
                .max()
                .unwrap_or(0);

            let depth = if self.graph[node].is_operation() {
                max_pred_depth + 1
            } else {
                max_pred_depth
            };
            depths[node.index()] = depth;
            max_depth = max_depth.max(depth);
        }

        max_depth
    }
}

/// Queue indices of every node reachable from `starts`, starts included.
fn reachable<G>(graph: G, starts: &[NodeIndex]) -> BTreeSet<usize>
where
    G: IntoNeighbors<NodeId = NodeIndex> + Visitable<NodeId = NodeIndex>,
{
    let mut dfs = Dfs::empty(graph);
    let mut found = BTreeSet::new();
    for &start in starts {
        dfs.move_to(start);
        while let Some(node) = dfs.next(graph) {
            found.insert(node.index());
        }
    }
    found
}
