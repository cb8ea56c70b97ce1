//! Dependency Graph (C2): table-to-table FK edges, topological ordering,
//! transitive dependency/dependent queries, and cycle detection.
use crate::catalog::Catalog;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeMap, HashSet, VecDeque};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Directed graph over tables: an edge A -> B means A declares an FK
/// referencing B. Built once from a `Catalog` and consulted by the
/// sampling engine and output generator.
pub struct DependencyGraph {
    graph: DiGraph<TableRef, ()>,
    nodes: BTreeMap<TableRef, NodeIndex>,
    /// Discovery order, used as the stable tie-break for Kahn's algorithm.
    discovery_order: Vec<TableRef>,
}

impl DependencyGraph {
    /// Build the graph from every table in `catalog` and the FK constraints
    /// declared among them. Self-loops are kept; repeated FKs between the
    /// same pair collapse to a single edge.
    pub fn build(catalog: &Catalog) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = BTreeMap::new();
        let mut discovery_order = Vec::new();

        for table in &catalog.tables {
            let node_ref = TableRef::new(table.schema.clone(), table.name.clone());
            let idx = graph.add_node(node_ref.clone());
            nodes.insert(node_ref.clone(), idx);
            discovery_order.push(node_ref);
        }

        let mut seen_edges = HashSet::new();
        for table in &catalog.tables {
            let from = TableRef::new(table.schema.clone(), table.name.clone());
            let Some(&from_idx) = nodes.get(&from) else {
                continue;
            };
            for fk in catalog.foreign_keys_for(&table.schema, &table.name) {
                if let crate::catalog::constraint::ConstraintType::ForeignKey {
                    referenced_schema,
                    referenced_table,
                    ..
                } = &fk.constraint_type
                {
                    let to = TableRef::new(referenced_schema.clone(), referenced_table.clone());
                    if let Some(&to_idx) = nodes.get(&to)
                        && seen_edges.insert((from_idx, to_idx))
                    {
                        graph.add_edge(from_idx, to_idx, ());
                    }
                }
            }
        }

        Self {
            graph,
            nodes,
            discovery_order,
        }
    }

    /// Leaves-first order suitable for INSERT statements: a dependency
    /// never appears after its dependents unless they share a cycle. Tables
    /// left over after Kahn's algorithm terminates (cycle participants) are
    /// appended in lexicographic order.
    pub fn insertion_order(&self) -> Vec<TableRef> {
        let mut in_degree: BTreeMap<NodeIndex, usize> = BTreeMap::new();
        for idx in self.graph.node_indices() {
            in_degree.insert(idx, 0);
        }
        // Edge A -> B means A depends on B, so B must be inserted first:
        // in_degree counts dependencies still unresolved for each node.
        for idx in self.graph.node_indices() {
            for _ in self.graph.edges(idx) {
                *in_degree.get_mut(&idx).unwrap() += 1;
            }
        }

        let mut ready: VecDeque<NodeIndex> = self
            .discovery_order
            .iter()
            .filter_map(|r| self.nodes.get(r))
            .filter(|idx| in_degree[idx] == 0)
            .copied()
            .collect();

        let mut order = Vec::new();
        let mut visited = HashSet::new();

        while let Some(idx) = ready.pop_front() {
            if !visited.insert(idx) {
                continue;
            }
            order.push(self.graph[idx].clone());

            // Nodes depending on `idx` (reverse edges) may now be ready.
            for edge in self
                .graph
                .edges_directed(idx, petgraph::Direction::Incoming)
            {
                let dependent = edge.source();
                let degree = in_degree.get_mut(&dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        let mut leftover: Vec<TableRef> = self
            .graph
            .node_indices()
            .filter(|idx| !visited.contains(idx))
            .map(|idx| self.graph[idx].clone())
            .collect();
        leftover.sort();
        order.extend(leftover);

        order
    }

    /// `constraintCreationOrder` per §4.2: reverse of insertion order, so
    /// every FK target already exists when its constraint is added.
    pub fn constraint_creation_order(&self) -> Vec<TableRef> {
        let mut order = self.insertion_order();
        order.reverse();
        order
    }

    /// Transitive set of tables `t` depends on (BFS over forward edges).
    pub fn dependencies(&self, t: &TableRef) -> Vec<TableRef> {
        self.bfs(t, petgraph::Direction::Outgoing)
    }

    /// Transitive set of tables that depend on `t` (BFS over reverse edges).
    pub fn dependents(&self, t: &TableRef) -> Vec<TableRef> {
        self.bfs(t, petgraph::Direction::Incoming)
    }

    fn bfs(&self, t: &TableRef, direction: petgraph::Direction) -> Vec<TableRef> {
        let Some(&start) = self.nodes.get(t) else {
            return Vec::new();
        };
        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(start);
        visited.insert(start);
        let mut out = Vec::new();

        while let Some(idx) = queue.pop_front() {
            for edge in self.graph.edges_directed(idx, direction) {
                let next = if direction == petgraph::Direction::Outgoing {
                    edge.target()
                } else {
                    edge.source()
                };
                if visited.insert(next) {
                    out.push(self.graph[next].clone());
                    queue.push_back(next);
                }
            }
        }

        out
    }

    pub fn has_cycles(&self) -> bool {
        !self.cycle_groups().is_empty()
    }

    /// Strongly connected components of size > 1 (or a self-loop),
    /// normalised to start at the lexicographically smallest member.
    pub fn cycle_groups(&self) -> Vec<Vec<TableRef>> {
        let sccs = petgraph::algo::tarjan_scc(&self.graph);
        let mut groups: Vec<Vec<TableRef>> = Vec::new();

        for scc in sccs {
            let is_self_loop = scc.len() == 1
                && self
                    .graph
                    .edges(scc[0])
                    .any(|e| e.target() == scc[0]);
            if scc.len() > 1 || is_self_loop {
                let mut members: Vec<TableRef> =
                    scc.into_iter().map(|idx| self.graph[idx].clone()).collect();
                members.sort();
                groups.push(members);
            }
        }

        groups.sort();
        groups
    }
}
