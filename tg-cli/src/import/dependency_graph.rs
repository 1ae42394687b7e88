//! Dependency graph logic for ordering entity types
//!
//! This module provides functions to:
//! - Build a dependency graph from declared `(type, depends-on)` edges
//! - Perform a deterministic topological sort for plan/create ordering
//! - Expand a selection of types with everything it depends on

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

use super::error::ImportError;
use super::types::EntityType;

/// Dependency graph over a set of nodes
#[derive(Debug, Clone)]
pub struct DependencyGraph<T> {
    /// Nodes in declaration order (ties in the sort keep this order)
    nodes: Vec<T>,
    /// Adjacency list: node -> nodes it depends on
    dependencies: HashMap<T, Vec<T>>,
    /// Reverse adjacency: node -> nodes that depend on it
    dependents: HashMap<T, Vec<T>>,
}

impl<T> Default for DependencyGraph<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            dependencies: HashMap::new(),
            dependents: HashMap::new(),
        }
    }
}

impl<T: Copy + Eq + Hash + fmt::Display> DependencyGraph<T> {
    /// Build a graph from nodes and `(dependent, dependency)` edges.
    /// Edges touching a node outside `nodes` are ignored, as are self-references.
    pub fn build(nodes: &[T], edges: &[(T, T)]) -> Self {
        let mut graph = DependencyGraph::default();
        for node in nodes {
            graph.add_node(*node);
        }
        for (dependent, dependency) in edges {
            graph.add_edge(*dependent, *dependency);
        }
        graph
    }

    pub fn add_node(&mut self, node: T) {
        if !self.dependencies.contains_key(&node) {
            self.nodes.push(node);
            self.dependencies.insert(node, Vec::new());
            self.dependents.insert(node, Vec::new());
        }
    }

    pub fn add_edge(&mut self, dependent: T, dependency: T) {
        if dependent == dependency
            || !self.dependencies.contains_key(&dependent)
            || !self.dependencies.contains_key(&dependency)
        {
            return;
        }
        let deps = self.dependencies.entry(dependent).or_default();
        if !deps.contains(&dependency) {
            deps.push(dependency);
            self.dependents.entry(dependency).or_default().push(dependent);
        }
    }

    pub fn dependencies_of(&self, node: &T) -> &[T] {
        self.dependencies.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Perform topological sort using Kahn's algorithm.
    /// Returns nodes with dependencies first.
    pub fn topological_sort(&self) -> Result<Vec<T>, CycleError<T>> {
        // in-degree = number of unmet dependencies
        let mut in_degree: HashMap<T, usize> = self
            .nodes
            .iter()
            .map(|n| (*n, self.dependencies_of(n).len()))
            .collect();

        let mut queue: VecDeque<T> = self
            .nodes
            .iter()
            .filter(|n| in_degree.get(*n) == Some(&0))
            .copied()
            .collect();
        let mut result = Vec::with_capacity(self.nodes.len());

        while let Some(node) = queue.pop_front() {
            result.push(node);

            if let Some(dependents) = self.dependents.get(&node) {
                for dependent in dependents {
                    if let Some(count) = in_degree.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            queue.push_back(*dependent);
                        }
                    }
                }
            }
        }

        if result.len() != self.nodes.len() {
            let remaining = self
                .nodes
                .iter()
                .filter(|n| !result.contains(n))
                .copied()
                .collect();
            return Err(CycleError { nodes: remaining });
        }

        Ok(result)
    }
}

/// Error when a cycle is detected in the dependency graph
#[derive(Debug, Clone)]
pub struct CycleError<T> {
    pub nodes: Vec<T>,
}

impl<T: fmt::Display> fmt::Display for CycleError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.nodes.iter().map(|n| n.to_string()).collect();
        write!(f, "Circular dependency detected involving: {}", names.join(", "))
    }
}

impl<T: fmt::Debug + fmt::Display> std::error::Error for CycleError<T> {}

impl From<CycleError<EntityType>> for ImportError {
    fn from(err: CycleError<EntityType>) -> Self {
        ImportError::DependencyCycle {
            entity_types: err.nodes.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Declared edges between all known entity types
pub fn entity_edges() -> Vec<(EntityType, EntityType)> {
    EntityType::ALL
        .iter()
        .flat_map(|t| t.dependencies().iter().map(move |d| (*t, *d)))
        .collect()
}

/// Order the requested entity types so dependencies come first
pub fn entity_order(entity_types: &[EntityType]) -> Result<Vec<EntityType>, ImportError> {
    let graph = DependencyGraph::build(entity_types, &entity_edges());
    Ok(graph.topological_sort()?)
}

/// Requested types plus everything they transitively depend on
pub fn dependency_closure(entity_types: &[EntityType]) -> Vec<EntityType> {
    let mut closure: Vec<EntityType> = Vec::new();
    let mut stack: Vec<EntityType> = entity_types.to_vec();
    while let Some(t) = stack.pop() {
        if closure.contains(&t) {
            continue;
        }
        closure.push(t);
        stack.extend(t.dependencies().iter().copied());
    }
    closure.sort();
    closure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_after_remote_network() {
        let order = entity_order(&[EntityType::Resource, EntityType::RemoteNetwork]).unwrap();
        assert_eq!(order, vec![EntityType::RemoteNetwork, EntityType::Resource]);
    }

    #[test]
    fn test_dependency_outside_selection_ignored_for_ordering() {
        let order = entity_order(&[EntityType::Resource]).unwrap();
        assert_eq!(order, vec![EntityType::Resource]);
    }

    #[test]
    fn test_topological_sort_chain() {
        let graph = DependencyGraph::build(
            &["child", "parent", "grandparent"],
            &[("child", "parent"), ("parent", "grandparent")],
        );
        let order = graph.topological_sort().unwrap();
        assert_eq!(order, vec!["grandparent", "parent", "child"]);
    }

    #[test]
    fn test_independent_nodes_keep_declaration_order() {
        let graph = DependencyGraph::build(&["b", "a", "c"], &[("c", "a")]);
        assert_eq!(graph.topological_sort().unwrap(), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_cycle_detected() {
        let graph = DependencyGraph::build(
            &["standalone", "x", "y"],
            &[("x", "y"), ("y", "x")],
        );
        let err = graph.topological_sort().unwrap_err();
        assert_eq!(err.nodes, vec!["x", "y"]);
        assert_eq!(err.to_string(), "Circular dependency detected involving: x, y");
    }

    #[test]
    fn test_self_reference_ignored() {
        let graph = DependencyGraph::build(&["account"], &[("account", "account")]);
        assert_eq!(graph.topological_sort().unwrap(), vec!["account"]);
    }

    #[test]
    fn test_cycle_converts_to_import_error() {
        let err: ImportError = CycleError {
            nodes: vec![EntityType::RemoteNetwork, EntityType::Resource],
        }
        .into();
        assert!(matches!(
            err,
            ImportError::DependencyCycle { ref entity_types } if entity_types.len() == 2
        ));
    }

    #[test]
    fn test_closure_adds_dependencies() {
        assert_eq!(
            dependency_closure(&[EntityType::Resource]),
            vec![EntityType::RemoteNetwork, EntityType::Resource]
        );
        assert_eq!(
            dependency_closure(&[EntityType::RemoteNetwork]),
            vec![EntityType::RemoteNetwork]
        );
    }
}
