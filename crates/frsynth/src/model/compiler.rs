//! Recursive population-model compiler.

use crate::config::{CompilerParams, ParamValidationError};
use crate::dataset::Dataset;
use crate::fit::fit;
use crate::partition::refine;

use super::completed::CompletedSet;
use super::node::{Branch, ModelNode};

// =============================================================================
// Errors
// =============================================================================

/// Errors that prevent compiling a population model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("dataset has no rows")]
    EmptyDataset,

    #[error("column '{column}' has non-finite value {value} at row {row}")]
    NonFinite { column: String, row: usize, value: f64 },

    #[error(transparent)]
    InvalidParams(#[from] ParamValidationError),
}

// =============================================================================
// PopulationModel
// =============================================================================

/// Conditional generative model of a dataset.
///
/// Roots are the columns that are not conditioned on any other column, in
/// column order. Every column is modeled exactly once along any path from a
/// root into the nested branches.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationModel {
    names: Vec<String>,
    roots: Vec<ModelNode>,
}

impl PopulationModel {
    #[inline]
    pub fn roots(&self) -> &[ModelNode] {
        &self.roots
    }

    /// Root modeling `name`, if that column is unconditioned.
    pub fn root(&self, name: &str) -> Option<&ModelNode> {
        self.roots.iter().find(|n| n.name() == name)
    }

    /// Column names of the source dataset.
    #[inline]
    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    /// Deepest nesting of partitions below any root.
    pub fn depth(&self) -> usize {
        self.roots.iter().map(ModelNode::depth).max().unwrap_or(0)
    }
}

// =============================================================================
// Compilation
// =============================================================================

/// Compile `dataset` into a [`PopulationModel`].
///
/// Columns are visited in declared order. Each column that is not yet modeled
/// becomes a root with its marginal fit, and is then expanded: every later,
/// not yet modeled column is refined against it, and accepted refinements
/// become partitions whose branches are expanded in turn over their rows,
/// down to `params.max_depth` nested levels.
///
/// # Errors
///
/// Returns [`ModelError`] if the parameters are invalid, the dataset has no
/// rows or contains non-finite values.
///
/// # Example
///
/// ```
/// use frsynth::{CompilerParams, Dataset, compile};
///
/// let ds = Dataset::from_columns(vec![
///     ("x", vec![1.0, 2.0, 3.0, 4.0]),
///     ("y", vec![2.0, 1.0, 4.0, 3.0]),
/// ])
/// .unwrap();
/// let model = compile(&ds, &CompilerParams::default()).unwrap();
/// assert!(model.depth() <= 2);
/// ```
pub fn compile(dataset: &Dataset, params: &CompilerParams) -> Result<PopulationModel, ModelError> {
    params.validate()?;
    if dataset.n_rows() == 0 {
        return Err(ModelError::EmptyDataset);
    }
    for (idx, name) in dataset.names().iter().enumerate() {
        if let Some((row, &value)) = dataset.column(idx).iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(ModelError::NonFinite {
                column: name.clone(),
                row,
                value,
            });
        }
    }

    let _span = tracing::debug_span!("compile population", columns = dataset.n_columns()).entered();
    let compiler = ModelCompiler { dataset, params };
    let rows = dataset.all_rows();
    let mut completed = CompletedSet::new(dataset.n_columns());
    let mut roots = Vec::new();

    for column in 0..dataset.n_columns() {
        if completed.contains(column) {
            tracing::debug!(column = dataset.name(column), "already conditioned, skipping");
            continue;
        }
        let values = dataset.gather(column, &rows);
        let marginal = match fit(&values, params) {
            Ok(marginal) => marginal,
            Err(error) => {
                tracing::warn!(column = dataset.name(column), %error, "marginal fit failed, column skipped");
                continue;
            }
        };
        completed.insert(column);

        let mut root = ModelNode::new(column, dataset.name(column), marginal);
        compiler.expand(&mut root, &rows, &mut completed, 0);
        roots.push(root);
    }

    tracing::debug!(roots = roots.len(), "population model compiled");
    Ok(PopulationModel {
        names: dataset.names().to_vec(),
        roots,
    })
}

struct ModelCompiler<'a> {
    dataset: &'a Dataset,
    params: &'a CompilerParams,
}

impl ModelCompiler<'_> {
    /// Condition later columns on `node`'s variable over `rows`.
    ///
    /// `completed` is this path's set; accepted subjects and every column that
    /// all their branches agree on are added to it.
    fn expand(&self, node: &mut ModelNode, rows: &[usize], completed: &mut CompletedSet, depth: usize) {
        if depth >= self.params.max_depth {
            return;
        }
        let _span = tracing::debug_span!("expand", column = node.name(), depth, rows = rows.len()).entered();

        let conditioning = self.dataset.gather(node.column(), rows);
        for subject in node.column() + 1..self.dataset.n_columns() {
            if completed.contains(subject) {
                continue;
            }
            let subject_name = self.dataset.name(subject);
            let values = self.dataset.gather(subject, rows);

            let refinement = match refine(&values, &conditioning, self.params) {
                Ok(Some(refinement)) => refinement,
                Ok(None) => continue,
                Err(error) => {
                    tracing::warn!(subject = subject_name, %error, "refinement failed, column left unconditioned");
                    continue;
                }
            };
            tracing::debug!(
                subject = subject_name,
                thresholds = ?refinement.thresholds(),
                "partition accepted"
            );

            completed.insert(subject);
            let thresholds = refinement.thresholds().to_vec();
            let mut branches = Vec::with_capacity(thresholds.len() + 1);
            for bucket in refinement.into_buckets() {
                let branch_rows = self.dataset.filter_rows(node.column(), rows, |v| bucket.range.contains(v));
                let mut child = ModelNode::new(subject, subject_name, bucket.fit);
                let mut branch_completed = completed.clone();
                self.expand(&mut child, &branch_rows, &mut branch_completed, depth + 1);
                branches.push(Branch::new(bucket.range, vec![child]));
            }

            let agreed = reconcile(&mut branches, self.dataset.n_columns());
            completed.union_with(&agreed);
            node.attach(thresholds, branches);
        }
    }
}

/// Prune sibling branches down to the columns every one of them models.
///
/// Pruning a node removes its whole subtree, which can shrink the shared set
/// again, so this repeats until nothing changes. Returns the shared set.
pub(crate) fn reconcile(branches: &mut [Branch], n_columns: usize) -> CompletedSet {
    loop {
        let mut shared: Option<CompletedSet> = None;
        for branch in branches.iter() {
            let columns = branch.columns(n_columns);
            match shared.as_mut() {
                Some(set) => set.intersect_with(&columns),
                None => shared = Some(columns),
            }
        }
        let shared = shared.unwrap_or_else(|| CompletedSet::new(n_columns));

        let mut changed = false;
        for branch in branches.iter_mut() {
            changed |= branch.retain_columns(&shared);
        }
        if !changed {
            return shared;
        }
        tracing::trace!(shared = shared.len(), "pruned one-sided columns");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::FitDescriptor;
    use crate::partition::PartitionRange;

    fn node(column: usize, name: &str) -> ModelNode {
        ModelNode::new(column, name, FitDescriptor::Gaussian { mean: 0.0, std: 1.0 })
    }

    #[test]
    fn one_sided_columns_are_pruned() {
        // Branch 0 conditioned column 2 on column 1, branch 1 did not.
        let mut deep = node(1, "b");
        let (lo, hi) = PartitionRange::unbounded().split_at(0.0);
        deep.attach(
            vec![0.0],
            vec![Branch::new(lo, vec![node(2, "c")]), Branch::new(hi, vec![node(2, "c")])],
        );
        let (below, above) = PartitionRange::unbounded().split_at(5.0);
        let mut branches = vec![Branch::new(below, vec![deep]), Branch::new(above, vec![node(1, "b")])];

        let shared = reconcile(&mut branches, 3);
        assert_eq!(shared.iter().collect::<Vec<_>>(), vec![1]);
        assert!(branches[0].nodes()[0].is_leaf());
    }

    #[test]
    fn agreed_columns_survive() {
        let (below, above) = PartitionRange::unbounded().split_at(5.0);
        let mut branches = vec![
            Branch::new(below, vec![node(1, "b"), node(2, "c")]),
            Branch::new(above, vec![node(1, "b"), node(2, "c")]),
        ];
        let shared = reconcile(&mut branches, 3);
        assert_eq!(shared.len(), 2);
        assert_eq!(branches[1].nodes().len(), 2);
    }

    #[test]
    fn rejects_empty_and_non_finite_datasets() {
        let params = CompilerParams::default();
        let empty = Dataset::from_columns(vec![("a", Vec::<f64>::new())]).unwrap();
        assert_eq!(compile(&empty, &params), Err(ModelError::EmptyDataset));

        let bad = Dataset::from_columns(vec![("a", vec![1.0, f64::INFINITY])]).unwrap();
        assert!(matches!(
            compile(&bad, &params),
            Err(ModelError::NonFinite { row: 1, .. })
        ));

        let ds = Dataset::from_columns(vec![("a", vec![1.0, 2.0])]).unwrap();
        let zero_depth = CompilerParams::default().with_max_depth(0);
        assert!(matches!(compile(&ds, &zero_depth), Err(ModelError::InvalidParams(_))));
    }

    #[test]
    fn independent_columns_stay_roots() {
        use crate::testing::data::gaussian_column;
        let ds = Dataset::from_columns(vec![
            ("a", gaussian_column(1000, 0.0, 1.0, 21)),
            ("b", gaussian_column(1000, 3.0, 2.0, 22)),
        ])
        .unwrap();
        let model = compile(&ds, &CompilerParams::default()).unwrap();
        assert_eq!(model.roots().len(), 2);
        assert_eq!(model.depth(), 0);
        assert!(model.root("b").is_some());
    }
}
