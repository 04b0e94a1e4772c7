//! Cycle breaking for the label taxonomy
//!
//! User-editable label hierarchies arrive as arbitrary edge lists and must
//! stay a DAG. Instead of rejecting a cyclic update wholesale, the validator
//! accepts every edge that does not close a cycle and reports the rest.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// A single `child -> parent` edge in the label taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LabelEdge {
    /// Label being placed under a parent
    pub child: String,
    /// Parent label
    pub parent: String,
}

impl LabelEdge {
    /// Create a new edge
    pub fn new(child: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            child: child.into(),
            parent: parent.into(),
        }
    }
}

impl std::fmt::Display for LabelEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.child, self.parent)
    }
}

/// DFS node color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// Undiscovered
    White,
    /// On the current DFS path
    Gray,
    /// Finished
    Black,
}

/// Split an edge list into an acyclic accepted set and the dropped edges
///
/// Runs an iterative three-color DFS over every undiscovered label. While a
/// label is on the current DFS path it is gray; traversing an edge whose
/// parent is gray would close a cycle, so that edge is dropped (self-loops
/// included). Edges to white labels descend; edges to black labels are safe
/// forward/cross edges and are accepted.
///
/// Guarantees:
/// - `accepted` and `dropped` partition the input as a multiset
/// - `accepted` is always acyclic
/// - `break_cycles(accepted) == (accepted, [])`
/// - an already-acyclic input is returned unchanged with no drops
pub fn break_cycles(edges: Vec<LabelEdge>) -> (Vec<LabelEdge>, Vec<LabelEdge>) {
    // Intern label ids in first-appearance order so the traversal is
    // deterministic for a given input ordering.
    let mut ids: AHashMap<String, u32> = AHashMap::new();
    let mut node_count: u32 = 0;
    let mut intern = |name: &str, ids: &mut AHashMap<String, u32>| -> u32 {
        if let Some(&id) = ids.get(name) {
            return id;
        }
        let id = node_count;
        ids.insert(name.to_string(), id);
        node_count += 1;
        id
    };

    // Adjacency keyed by child, in input edge order.
    let mut edge_ids = Vec::with_capacity(edges.len());
    for edge in &edges {
        let child = intern(&edge.child, &mut ids);
        let parent = intern(&edge.parent, &mut ids);
        edge_ids.push((child, parent));
    }

    let n = node_count as usize;
    let mut adjacency: Vec<Vec<(usize, u32)>> = vec![Vec::new(); n];
    for (edge_index, &(child, parent)) in edge_ids.iter().enumerate() {
        adjacency[child as usize].push((edge_index, parent));
    }

    let mut colors = vec![Color::White; n];
    let mut drop_edge = vec![false; edges.len()];
    // Explicit (node, next_edge_index) work stack instead of recursion, so
    // adversarially deep taxonomies cannot overflow the call stack.
    let mut stack: Vec<(u32, usize)> = Vec::new();

    for start in 0..n as u32 {
        if colors[start as usize] != Color::White {
            continue;
        }

        colors[start as usize] = Color::Gray;
        stack.push((start, 0));

        while let Some(&mut (node, ref mut next)) = stack.last_mut() {
            let out = &adjacency[node as usize];
            if *next < out.len() {
                let (edge_index, parent) = out[*next];
                *next += 1;

                match colors[parent as usize] {
                    Color::Gray => drop_edge[edge_index] = true,
                    Color::White => {
                        colors[parent as usize] = Color::Gray;
                        stack.push((parent, 0));
                    }
                    Color::Black => {}
                }
            } else {
                colors[node as usize] = Color::Black;
                stack.pop();
            }
        }
    }

    let mut accepted = Vec::with_capacity(edges.len());
    let mut dropped = Vec::new();
    for (edge_index, edge) in edges.into_iter().enumerate() {
        if drop_edge[edge_index] {
            dropped.push(edge);
        } else {
            accepted.push(edge);
        }
    }

    (accepted, dropped)
}
