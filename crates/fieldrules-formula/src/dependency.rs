//! Dependency tracking between fields
//!
//! An edge `precedent → dependent` means the dependent's value is computed
//! from the precedent. Maps are ordered so every traversal is deterministic.

use std::collections::{BTreeMap, BTreeSet};

/// Dependency graph over field ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    /// Every known field, including isolated ones
    fields: BTreeSet<String>,
    /// Field → fields that depend on it (dependents)
    dependents: BTreeMap<String, BTreeSet<String>>,
    /// Field → fields it depends on (precedents)
    precedents: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a field with no edges
    pub fn add_field(&mut self, field: impl Into<String>) {
        self.fields.insert(field.into());
    }

    /// Add a dependency: dependent depends on precedent
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.fields.insert(precedent.to_string());
        self.fields.insert(dependent.to_string());
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// All known fields in sorted order
    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(String::as_str)
    }

    /// Get fields that depend on the given field
    pub fn get_dependents(&self, field: &str) -> impl Iterator<Item = &str> + '_ {
        self.dependents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Get fields that the given field depends on
    pub fn get_precedents(&self, field: &str) -> impl Iterator<Item = &str> + '_ {
        self.precedents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Order fields so that every precedent comes before its dependents
    ///
    /// Fields on a cycle are left out; see [`circular_fields`](Self::circular_fields).
    pub fn calculation_order(&self) -> Vec<String> {
        let circular = self.circular_fields();
        let mut result = Vec::new();
        let mut visited = BTreeSet::new();
        let mut in_stack = BTreeSet::new();

        for field in &self.fields {
            self.topological_sort(field, &circular, &mut result, &mut visited, &mut in_stack);
        }

        result
    }

    /// Topological sort helper (DFS over precedents)
    fn topological_sort<'g>(
        &'g self,
        field: &'g str,
        circular: &BTreeSet<String>,
        result: &mut Vec<String>,
        visited: &mut BTreeSet<&'g str>,
        in_stack: &mut BTreeSet<&'g str>,
    ) {
        if visited.contains(field) || in_stack.contains(field) {
            return;
        }

        in_stack.insert(field);

        // Visit all precedents first
        for precedent in self.get_precedents(field) {
            self.topological_sort(precedent, circular, result, visited, in_stack);
        }

        in_stack.remove(field);
        visited.insert(field);
        if !circular.contains(field) {
            result.push(field.to_string());
        }
    }

    /// Check whether a field can reach itself through its precedents
    pub fn is_on_cycle(&self, field: &str) -> bool {
        let mut visited = BTreeSet::new();
        let mut stack: Vec<&str> = self.get_precedents(field).collect();

        while let Some(current) = stack.pop() {
            if current == field {
                return true;
            }
            if visited.insert(current) {
                stack.extend(self.get_precedents(current));
            }
        }

        false
    }

    /// Every field that lies on at least one cycle
    pub fn circular_fields(&self) -> BTreeSet<String> {
        self.fields
            .iter()
            .filter(|field| self.is_on_cycle(field))
            .cloned()
            .collect()
    }

    /// Check if the graph contains any cycle
    pub fn has_cycles(&self) -> bool {
        self.fields.iter().any(|field| self.is_on_cycle(field))
    }
}
