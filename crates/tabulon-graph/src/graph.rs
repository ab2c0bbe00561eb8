//! The dependency graph: precedent/dependent edges, dirty propagation, and
//! Kahn's-algorithm calculation ordering.

use std::collections::VecDeque;

use rustc_hash::{FxHashMap, FxHashSet};
use tabulon_common::{CellKey, CellRange};
use tracing::warn;

use crate::error::CircularError;

/// Precedent/dependent edges plus the dirty, circular, and volatile sets
/// `spec.md` §3 names under "Dependency info". Reverse edges (`dependents`)
/// are stored explicitly — never derived by scanning `precedents` — per the
/// design note that scanning would be too slow for incremental updates.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    precedents: FxHashMap<CellKey, FxHashSet<CellKey>>,
    dependents: FxHashMap<CellKey, FxHashSet<CellKey>>,
    dirty: FxHashSet<CellKey>,
    circular: FxHashSet<CellKey>,
    volatile: FxHashSet<CellKey>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace `key`'s outbound edges with `precedents`. Detects cycles by
    /// DFS from `key` over the new precedent edges before committing; a
    /// self-reference is always a cycle of length one.
    pub fn set_deps(
        &mut self,
        key: CellKey,
        precedents: impl IntoIterator<Item = CellKey>,
        volatile: bool,
    ) -> Result<(), CircularError> {
        self.remove_deps(key);

        let new_precedents: FxHashSet<CellKey> = precedents.into_iter().collect();

        if new_precedents.contains(&key) {
            self.circular.insert(key);
            warn!(?key, "self-referential formula");
            return Err(CircularError { path: vec![key, key] });
        }

        // Tentatively wire the edges so cycle detection sees the full graph,
        // then roll back if a cycle is found.
        for &p in &new_precedents {
            self.dependents.entry(p).or_default().insert(key);
        }
        if new_precedents.is_empty() {
            self.precedents.remove(&key);
        } else {
            self.precedents.insert(key, new_precedents.clone());
        }

        if let Some(path) = self.detect_cycle_from(key) {
            self.precedents.remove(&key);
            for &p in &new_precedents {
                if let Some(set) = self.dependents.get_mut(&p) {
                    set.remove(&key);
                    if set.is_empty() {
                        self.dependents.remove(&p);
                    }
                }
            }
            for &member in &path {
                self.circular.insert(member);
            }
            warn!(?key, ?path, "circular reference detected");
            return Err(CircularError { path });
        }

        self.circular.remove(&key);
        if volatile {
            self.volatile.insert(key);
        } else {
            self.volatile.remove(&key);
        }
        Ok(())
    }

    fn detect_cycle_from(&self, start: CellKey) -> Option<Vec<CellKey>> {
        let mut stack = vec![(start, 0usize)];
        let mut path = vec![start];
        let mut on_path: FxHashSet<CellKey> = FxHashSet::default();
        on_path.insert(start);

        while let Some((node, child_idx)) = stack.last().copied() {
            let children: Vec<CellKey> = self
                .precedents
                .get(&node)
                .map(|s| s.iter().copied().collect())
                .unwrap_or_default();

            if child_idx >= children.len() {
                stack.pop();
                path.pop();
                on_path.remove(&node);
                continue;
            }

            stack.last_mut().unwrap().1 += 1;
            let child = children[child_idx];

            if child == start {
                path.push(child);
                return Some(path);
            }
            if on_path.contains(&child) {
                continue;
            }
            path.push(child);
            on_path.insert(child);
            stack.push((child, 0));
        }

        None
    }

    /// Remove every outbound edge from `key` (but leave inbound edges,
    /// i.e. cells that depend on `key`, untouched).
    pub fn remove_deps(&mut self, key: CellKey) {
        if let Some(old_precedents) = self.precedents.remove(&key) {
            for p in old_precedents {
                if let Some(set) = self.dependents.get_mut(&p) {
                    set.remove(&key);
                    if set.is_empty() {
                        self.dependents.remove(&p);
                    }
                }
            }
        }
        self.volatile.remove(&key);
        self.circular.remove(&key);
    }

    pub fn precedents_of(&self, key: CellKey) -> Vec<CellKey> {
        self.precedents.get(&key).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    pub fn dependents_of(&self, key: CellKey) -> Vec<CellKey> {
        self.dependents.get(&key).map(|s| s.iter().copied().collect()).unwrap_or_default()
    }

    /// BFS over outbound (dependent) edges from `key`, bounded by a visited
    /// set so cycles can't cause unbounded work.
    pub fn transitive_dependents(&self, key: CellKey) -> Vec<CellKey> {
        let mut visited: FxHashSet<CellKey> = FxHashSet::default();
        let mut queue: VecDeque<CellKey> = VecDeque::new();
        queue.push_back(key);
        visited.insert(key);
        let mut result = Vec::new();

        while let Some(node) = queue.pop_front() {
            for &dep in self.dependents.get(&node).into_iter().flatten() {
                if visited.insert(dep) {
                    result.push(dep);
                    queue.push_back(dep);
                }
            }
        }
        result
    }

    /// Add `key` and every transitive dependent to the dirty set.
    pub fn mark_dirty(&mut self, key: CellKey) {
        self.dirty.insert(key);
        for dep in self.transitive_dependents(key) {
            self.dirty.insert(dep);
        }
    }

    pub fn mark_range_dirty(&mut self, range: &CellRange) {
        for key in range.iter() {
            self.mark_dirty(key);
        }
    }

    pub fn mark_volatile_dirty(&mut self) {
        let volatile: Vec<CellKey> = self.volatile.iter().copied().collect();
        for key in volatile {
            self.mark_dirty(key);
        }
    }

    pub fn clear_all_dirty(&mut self) {
        self.dirty.clear();
    }

    pub fn has_circular(&self, key: CellKey) -> bool {
        self.circular.contains(&key)
    }

    pub fn is_volatile(&self, key: CellKey) -> bool {
        self.volatile.contains(&key)
    }

    pub fn is_dirty(&self, key: CellKey) -> bool {
        self.dirty.contains(&key)
    }

    /// Kahn's algorithm over the dirty subgraph: in-degree counts only
    /// dirty precedents. Nodes left over after the queue drains participate
    /// in a cycle and are appended at the end for best-effort recompute.
    pub fn calculation_order(&self) -> Vec<CellKey> {
        let dirty: Vec<CellKey> = self.dirty.iter().copied().collect();
        let dirty_set: FxHashSet<CellKey> = dirty.iter().copied().collect();

        let mut in_degree: FxHashMap<CellKey, usize> = FxHashMap::default();
        for &node in &dirty {
            let degree = self
                .precedents
                .get(&node)
                .map(|ps| ps.iter().filter(|p| dirty_set.contains(p)).count())
                .unwrap_or(0);
            in_degree.insert(node, degree);
        }

        let mut queue: VecDeque<CellKey> = in_degree
            .iter()
            .filter(|&(_, &deg)| deg == 0)
            .map(|(&k, _)| k)
            .collect();
        let mut order = Vec::with_capacity(dirty.len());
        let mut emitted: FxHashSet<CellKey> = FxHashSet::default();

        while let Some(node) = queue.pop_front() {
            if !emitted.insert(node) {
                continue;
            }
            order.push(node);
            for &dep in self.dependents.get(&node).into_iter().flatten() {
                if !dirty_set.contains(&dep) {
                    continue;
                }
                if let Some(deg) = in_degree.get_mut(&dep) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        queue.push_back(dep);
                    }
                }
            }
        }

        if order.len() < dirty.len() {
            for &node in &dirty {
                if !emitted.contains(&node) {
                    order.push(node);
                }
            }
        }

        order
    }
}
