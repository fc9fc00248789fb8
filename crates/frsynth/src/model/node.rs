//! Population model tree.

use crate::fit::FitDescriptor;
use crate::partition::PartitionRange;

use super::completed::CompletedSet;

// =============================================================================
// ModelNode
// =============================================================================

/// One variable's model at one point of the tree.
///
/// `partitions` split this node's own variable into ranges; each branch holds
/// the range-specific models of the variables conditioned on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    column: usize,
    name: String,
    fit: FitDescriptor,
    partitions: Vec<Partition>,
}

impl ModelNode {
    /// Node without partitions.
    pub fn new(column: usize, name: impl Into<String>, fit: FitDescriptor) -> Self {
        Self {
            column,
            name: name.into(),
            fit,
            partitions: Vec::new(),
        }
    }

    /// Dataset column this node models.
    #[inline]
    pub fn column(&self) -> usize {
        self.column
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn fit(&self) -> &FitDescriptor {
        &self.fit
    }

    /// Partitions on this node's variable, in discovery order.
    #[inline]
    pub fn partitions(&self) -> &[Partition] {
        &self.partitions
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Number of nested partition levels below this node.
    pub fn depth(&self) -> usize {
        self.partitions
            .iter()
            .flat_map(|p| p.branches.iter())
            .flat_map(|b| b.nodes.iter())
            .map(|n| 1 + n.depth())
            .max()
            .unwrap_or(0)
    }

    /// Add every column modeled in this subtree to `set`.
    pub fn collect_columns(&self, set: &mut CompletedSet) {
        set.insert(self.column);
        for branch in self.partitions.iter().flat_map(|p| p.branches.iter()) {
            branch.collect_columns(set);
        }
    }

    /// Attach branches split at `thresholds`.
    ///
    /// Branches whose thresholds exactly match an existing partition are merged
    /// into it, so subjects split the same way share one conditional block.
    pub(crate) fn attach(&mut self, thresholds: Vec<f64>, branches: Vec<Branch>) {
        if let Some(existing) = self.partitions.iter_mut().find(|p| p.thresholds == thresholds) {
            for (target, source) in existing.branches.iter_mut().zip(branches) {
                target.nodes.extend(source.nodes);
            }
            return;
        }
        self.partitions.push(Partition { thresholds, branches });
    }

    /// Drop descendants whose column is not in `keep`. Returns `true` if
    /// anything was removed.
    pub(crate) fn retain_columns(&mut self, keep: &CompletedSet) -> bool {
        let mut changed = false;
        for partition in &mut self.partitions {
            for branch in &mut partition.branches {
                changed |= branch.retain_columns(keep);
            }
        }
        // Branches of one partition stay symmetric, so one empty branch means
        // the whole partition lost its subjects.
        self.partitions.retain(|p| p.branches.iter().all(|b| !b.nodes.is_empty()));
        changed
    }
}

// =============================================================================
// Partition / Branch
// =============================================================================

/// Split of a node's variable at sorted `thresholds` into `thresholds.len() + 1` branches.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    thresholds: Vec<f64>,
    branches: Vec<Branch>,
}

impl Partition {
    #[inline]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    /// Branches in increasing range order.
    #[inline]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }
}

/// Models that hold while the conditioning variable lies in `range`.
#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    range: PartitionRange,
    nodes: Vec<ModelNode>,
}

impl Branch {
    pub(crate) fn new(range: PartitionRange, nodes: Vec<ModelNode>) -> Self {
        Self { range, nodes }
    }

    #[inline]
    pub fn range(&self) -> PartitionRange {
        self.range
    }

    /// Conditioned models, ordered by column.
    #[inline]
    pub fn nodes(&self) -> &[ModelNode] {
        &self.nodes
    }

    /// Node modeling `name`, if present directly in this branch.
    pub fn node(&self, name: &str) -> Option<&ModelNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Every column modeled in this branch, including nested branches.
    pub fn columns(&self, n_columns: usize) -> CompletedSet {
        let mut set = CompletedSet::new(n_columns);
        self.collect_columns(&mut set);
        set
    }

    fn collect_columns(&self, set: &mut CompletedSet) {
        for node in &self.nodes {
            node.collect_columns(set);
        }
    }

    pub(crate) fn retain_columns(&mut self, keep: &CompletedSet) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| keep.contains(n.column));
        let mut changed = self.nodes.len() != before;
        for node in &mut self.nodes {
            changed |= node.retain_columns(keep);
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(mean: f64) -> FitDescriptor {
        FitDescriptor::Gaussian { mean, std: 1.0 }
    }

    fn two_way(threshold: f64, column: usize, name: &str) -> Vec<Branch> {
        let (below, above) = PartitionRange::unbounded().split_at(threshold);
        vec![
            Branch::new(below, vec![ModelNode::new(column, name, gaussian(0.0))]),
            Branch::new(above, vec![ModelNode::new(column, name, gaussian(5.0))]),
        ]
    }

    #[test]
    fn equal_thresholds_share_a_partition() {
        let mut root = ModelNode::new(0, "a", gaussian(0.0));
        root.attach(vec![1.0], two_way(1.0, 1, "b"));
        root.attach(vec![1.0], two_way(1.0, 2, "c"));
        root.attach(vec![2.0], two_way(2.0, 3, "d"));

        assert_eq!(root.partitions().len(), 2);
        let shared = &root.partitions()[0];
        assert_eq!(shared.branches()[0].nodes().len(), 2);
        assert!(shared.branches()[1].node("c").is_some());
        assert_eq!(root.depth(), 1);
    }

    #[test]
    fn retain_prunes_empty_partitions() {
        let mut root = ModelNode::new(0, "a", gaussian(0.0));
        root.attach(vec![1.0], two_way(1.0, 1, "b"));
        root.attach(vec![3.0], two_way(3.0, 2, "c"));

        let mut keep = CompletedSet::new(3);
        keep.extend([0, 2]);
        assert!(root.retain_columns(&keep));
        assert_eq!(root.partitions().len(), 1);
        assert_eq!(root.partitions()[0].thresholds(), &[3.0]);
        assert!(!root.retain_columns(&keep));
    }

    #[test]
    fn collects_nested_columns() {
        let mut inner = ModelNode::new(1, "b", gaussian(0.0));
        inner.attach(vec![0.0], two_way(0.0, 2, "c"));
        let (below, above) = PartitionRange::unbounded().split_at(9.0);
        let mut root = ModelNode::new(0, "a", gaussian(0.0));
        root.attach(
            vec![9.0],
            vec![
                Branch::new(below, vec![inner]),
                Branch::new(above, vec![ModelNode::new(1, "b", gaussian(1.0))]),
            ],
        );

        assert_eq!(root.depth(), 2);
        let first = root.partitions()[0].branches()[0].columns(3);
        assert_eq!(first.iter().collect::<Vec<_>>(), vec![1, 2]);
        let second = root.partitions()[0].branches()[1].columns(3);
        assert_eq!(second.iter().collect::<Vec<_>>(), vec![1]);
    }
}
