//! Unrolling classifiers into rule trees.

use ndarray::Array2;

use crate::config::CompilerParams;

use super::error::ExtractError;
use super::kinds::{Activation, Classifier, DecisionTree, Linear, Mlp, Pipeline, Scaler};
use super::rule::{BinaryOp, Comparison, Condition, Expr, RuleNode, Statement};

/// Result of unrolling a classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Feature names visible after the classifier. Scalers rename their
    /// inputs; every other kind passes them through.
    pub features: Vec<String>,
    pub rules: RuleNode,
}

/// Unroll `classifier` into rules that read `features` and write `target`.
///
/// # Errors
///
/// Returns [`ExtractError`] for unsupported kinds or activations, arrays
/// whose shapes disagree with `features` or with each other, invalid tree
/// nodes and empty pipelines.
pub fn extract(
    classifier: &Classifier,
    features: &[String],
    target: &str,
    params: &CompilerParams,
) -> Result<Extraction, ExtractError> {
    let _span = tracing::debug_span!("extract", kind = classifier.kind(), features = features.len()).entered();

    let rules = match classifier {
        Classifier::DecisionTree(tree) => extract_tree(tree, features, target)?,
        Classifier::Linear(linear) => extract_linear(linear, features, target)?,
        Classifier::Mlp(mlp) => extract_mlp(mlp, features, target, params.mlp_output_offset)?,
        Classifier::Scaler(scaler) => return extract_scaler(scaler, features),
        Classifier::Pipeline(pipeline) => return extract_pipeline(pipeline, features, target, params),
        Classifier::Unsupported { kind } => return Err(ExtractError::UnsupportedKind(kind.clone())),
    };
    tracing::debug!(branches = rules.n_branches(), "classifier unrolled");
    Ok(Extraction {
        features: features.to_vec(),
        rules,
    })
}

// =============================================================================
// Decision tree
// =============================================================================

fn extract_tree(tree: &DecisionTree, features: &[String], target: &str) -> Result<RuleNode, ExtractError> {
    let n_nodes = tree.children_left.len();
    if n_nodes == 0 {
        return Err(ExtractError::InvalidNode {
            node: 0,
            reason: "tree has no nodes".into(),
        });
    }
    for (what, len) in [
        ("children_right", tree.children_right.len()),
        ("feature", tree.feature.len()),
        ("threshold", tree.threshold.len()),
        ("value", tree.value.len()),
    ] {
        if len != n_nodes {
            return Err(ExtractError::shape(format!("tree {what}"), n_nodes, len));
        }
    }

    let mut visited = vec![false; n_nodes];
    TreeWalker {
        tree,
        features,
        target,
    }
    .node(0, &mut visited)
}

struct TreeWalker<'a> {
    tree: &'a DecisionTree,
    features: &'a [String],
    target: &'a str,
}

impl TreeWalker<'_> {
    fn node(&self, idx: usize, visited: &mut [bool]) -> Result<RuleNode, ExtractError> {
        if std::mem::replace(&mut visited[idx], true) {
            return Err(ExtractError::InvalidNode {
                node: idx,
                reason: "node reached twice".into(),
            });
        }

        if self.tree.children_left[idx] == -1 {
            return Ok(RuleNode::Leaf {
                target: self.target.to_string(),
                class: self.majority_class(idx)?,
            });
        }

        let left = self.child(idx, self.tree.children_left[idx])?;
        let right = self.child(idx, self.tree.children_right[idx])?;
        let feature = usize::try_from(self.tree.feature[idx])
            .ok()
            .and_then(|f| self.features.get(f))
            .ok_or_else(|| ExtractError::InvalidNode {
                node: idx,
                reason: format!(
                    "feature {} out of range for {} features",
                    self.tree.feature[idx],
                    self.features.len()
                ),
            })?;

        // Samples with `x <= t` go left, so the right child is the `>` branch.
        let condition = Condition::new(Expr::var(feature), Comparison::Gt, Expr::Const(self.tree.threshold[idx]));
        let then_branch = self.node(right, visited)?;
        let else_branch = self.node(left, visited)?;
        Ok(RuleNode::Branch {
            condition,
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
        })
    }

    fn child(&self, node: usize, child: i64) -> Result<usize, ExtractError> {
        usize::try_from(child)
            .ok()
            .filter(|&c| c < self.tree.children_left.len())
            .ok_or_else(|| ExtractError::InvalidNode {
                node,
                reason: format!(
                    "child {child} out of range for {} nodes",
                    self.tree.children_left.len()
                ),
            })
    }

    /// Index of the largest class count; the first one on ties.
    fn majority_class(&self, idx: usize) -> Result<usize, ExtractError> {
        let counts = &self.tree.value[idx];
        let mut best: Option<(usize, f64)> = None;
        for (class, &count) in counts.iter().enumerate() {
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((class, count));
            }
        }
        best.map(|(class, _)| class).ok_or_else(|| ExtractError::InvalidNode {
            node: idx,
            reason: "leaf has no class counts".into(),
        })
    }
}

// =============================================================================
// Linear
// =============================================================================

fn extract_linear(linear: &Linear, features: &[String], target: &str) -> Result<RuleNode, ExtractError> {
    if linear.coef.len() != features.len() {
        return Err(ExtractError::shape("linear coefficients", features.len(), linear.coef.len()));
    }
    Ok(RuleNode::Sequence(vec![
        Statement::assign(
            target,
            Expr::weighted_sum(features.iter().map(String::as_str), linear.coef.iter().copied()),
        ),
        add_constant(target, linear.intercept),
    ]))
}

/// `name = name + value`
fn add_constant(name: &str, value: f64) -> Statement {
    Statement::assign(name, Expr::binary(BinaryOp::Add, Expr::var(name), Expr::Const(value)))
}

// =============================================================================
// MLP
// =============================================================================

fn extract_mlp(mlp: &Mlp, features: &[String], target: &str, offset: Option<f64>) -> Result<RuleNode, ExtractError> {
    for activation in [&mlp.activation, &mlp.out_activation] {
        if let Activation::Unsupported(name) = activation {
            return Err(ExtractError::UnsupportedActivation(name.clone()));
        }
    }
    let n_layers = mlp.coefs.len();
    if n_layers == 0 {
        return Err(ExtractError::shape("mlp layers", 1, 0));
    }
    if mlp.intercepts.len() != n_layers {
        return Err(ExtractError::shape("mlp intercepts", n_layers, mlp.intercepts.len()));
    }

    let mut inputs: Vec<String> = features.to_vec();
    let mut statements = Vec::new();
    for (layer, (coefs, biases)) in mlp.coefs.iter().zip(&mlp.intercepts).enumerate() {
        let weights = layer_weights(layer, coefs, inputs.len())?;
        let n_out = weights.ncols();
        if biases.len() != n_out {
            return Err(ExtractError::shape(format!("mlp layer {layer} biases"), n_out, biases.len()));
        }

        let is_output = layer + 1 == n_layers;
        if is_output && n_out != 1 {
            return Err(ExtractError::shape("mlp output neurons", 1, n_out));
        }
        let activation = if is_output {
            &mlp.out_activation
        } else {
            &mlp.activation
        };

        let mut outputs = Vec::with_capacity(n_out);
        for (neuron, column) in weights.columns().into_iter().enumerate() {
            let name = if is_output {
                target.to_string()
            } else {
                format!("hidden_{layer}_{neuron}")
            };
            statements.push(Statement::assign(
                &name,
                Expr::weighted_sum(inputs.iter().map(String::as_str), column.iter().copied()),
            ));
            statements.push(add_constant(&name, biases[neuron]));
            statements.extend(activate(&name, activation));
            outputs.push(name);
        }
        inputs = outputs;
    }

    if let Some(offset) = offset {
        statements.push(add_constant(target, offset));
    }
    Ok(RuleNode::Sequence(statements))
}

/// Weight matrix `[n_in, n_out]` of one layer.
fn layer_weights(layer: usize, coefs: &[Vec<f64>], n_in: usize) -> Result<Array2<f64>, ExtractError> {
    if coefs.len() != n_in {
        return Err(ExtractError::shape(format!("mlp layer {layer} inputs"), n_in, coefs.len()));
    }
    let n_out = coefs.first().map_or(0, Vec::len);
    if n_out == 0 {
        return Err(ExtractError::shape(format!("mlp layer {layer} neurons"), 1, 0));
    }
    if let Some(row) = coefs.iter().find(|row| row.len() != n_out) {
        return Err(ExtractError::shape(format!("mlp layer {layer} neurons"), n_out, row.len()));
    }
    let flat: Vec<f64> = coefs.iter().flatten().copied().collect();
    let len = flat.len();
    Array2::from_shape_vec((n_in, n_out), flat)
        .map_err(|_| ExtractError::shape(format!("mlp layer {layer} weights"), n_in * n_out, len))
}

fn activate(name: &str, activation: &Activation) -> Option<Statement> {
    match activation {
        Activation::Relu => Some(Statement::Rule(RuleNode::Branch {
            condition: Condition::new(Expr::var(name), Comparison::Lt, Expr::Int(0)),
            then_branch: Box::new(RuleNode::Sequence(vec![Statement::assign(name, Expr::Int(0))])),
            else_branch: None,
        })),
        // 1 / (1 + e ** -name)
        Activation::Logistic => Some(Statement::assign(
            name,
            Expr::binary(
                BinaryOp::Div,
                Expr::Int(1),
                Expr::paren(Expr::binary(
                    BinaryOp::Add,
                    Expr::Int(1),
                    Expr::binary(BinaryOp::Pow, Expr::E, Expr::neg(Expr::var(name))),
                )),
            ),
        )),
        Activation::Identity | Activation::Unsupported(_) => None,
    }
}

// =============================================================================
// Scaler and pipeline
// =============================================================================

fn extract_scaler(scaler: &Scaler, features: &[String]) -> Result<Extraction, ExtractError> {
    for (what, values) in [("scaler mean", &scaler.mean), ("scaler scale", &scaler.scale)] {
        if let Some(values) = values
            && values.len() != features.len()
        {
            return Err(ExtractError::shape(what, features.len(), values.len()));
        }
    }

    let mut renamed = Vec::with_capacity(features.len());
    let mut statements = Vec::with_capacity(features.len());
    for (i, feature) in features.iter().enumerate() {
        let mean = scaler.mean.as_ref().map_or(0.0, |m| m[i]);
        let scale = scaler.scale.as_ref().map_or(1.0, |s| s[i]);
        let inv_scale = if scale == 0.0 { 1.0 } else { 1.0 / scale };

        let name = format!("scaled_{feature}");
        let centered = Expr::paren(Expr::binary(BinaryOp::Sub, Expr::var(feature), Expr::Const(mean)));
        statements.push(Statement::assign(
            &name,
            Expr::binary(BinaryOp::Mul, centered, Expr::Const(inv_scale)),
        ));
        renamed.push(name);
    }

    Ok(Extraction {
        features: renamed,
        rules: RuleNode::Sequence(statements),
    })
}

fn extract_pipeline(
    pipeline: &Pipeline,
    features: &[String],
    target: &str,
    params: &CompilerParams,
) -> Result<Extraction, ExtractError> {
    let mut features = features.to_vec();
    let mut rules: Option<RuleNode> = None;
    for step in &pipeline.steps {
        let stage = extract(step, &features, target, params)?;
        features = stage.features;
        rules = Some(match rules {
            Some(previous) => previous.then(stage.rules),
            None => stage.rules,
        });
    }
    let rules = rules.ok_or(ExtractError::EmptyPipeline)?;
    Ok(Extraction { features, rules })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    fn assigns(rules: &RuleNode) -> Vec<String> {
        let RuleNode::Sequence(statements) = rules else {
            panic!("expected sequence, got {rules:?}");
        };
        statements
            .iter()
            .filter_map(|s| match s {
                Statement::Assign { name, expr } => Some(format!("{name} = {}", expr.render(4))),
                Statement::Rule(_) => None,
            })
            .collect()
    }

    fn tree(children_left: Vec<i64>, children_right: Vec<i64>, feature: Vec<i64>) -> DecisionTree {
        let n = children_left.len();
        DecisionTree {
            children_left,
            children_right,
            feature,
            threshold: vec![0.5; n],
            value: vec![vec![2.0, 3.0]; n],
        }
    }

    #[test]
    fn linear_statements() {
        let clf = Classifier::Linear(Linear {
            coef: vec![1.0, -2.0, 0.5],
            intercept: 3.0,
        });
        let out = extract(&clf, &names(3), "target", &CompilerParams::default()).unwrap();
        assert_eq!(
            assigns(&out.rules),
            vec![
                "target = f0 * 1.0000 + f1 * -2.0000 + f2 * 0.5000",
                "target = target + 3.0000",
            ]
        );
    }

    #[test]
    fn linear_rejects_feature_count() {
        let clf = Classifier::Linear(Linear {
            coef: vec![1.0],
            intercept: 0.0,
        });
        let err = extract(&clf, &names(2), "t", &CompilerParams::default()).unwrap_err();
        assert!(matches!(err, ExtractError::ShapeMismatch { expected: 2, got: 1, .. }));
    }

    #[test]
    fn tree_right_child_is_greater_branch() {
        let mut tree = tree(vec![1, -1, -1], vec![2, -1, -1], vec![1, -2, -2]);
        tree.value = vec![vec![5.0, 5.0], vec![4.0, 1.0], vec![1.0, 4.0]];
        let clf = Classifier::DecisionTree(tree);
        let out = extract(&clf, &names(2), "y", &CompilerParams::default()).unwrap();

        let RuleNode::Branch {
            condition,
            then_branch,
            else_branch,
        } = &out.rules
        else {
            panic!("expected branch");
        };
        assert_eq!(condition.render(4), "f1 > 0.5000");
        assert_eq!(**then_branch, RuleNode::Leaf { target: "y".into(), class: 1 });
        assert_eq!(else_branch.as_deref(), Some(&RuleNode::Leaf { target: "y".into(), class: 0 }));
    }

    #[test]
    fn tie_picks_first_class() {
        let mut tree = tree(vec![-1], vec![-1], vec![-2]);
        tree.value = vec![vec![3.0, 3.0, 1.0]];
        let out = extract(&Classifier::DecisionTree(tree), &names(1), "y", &CompilerParams::default()).unwrap();
        assert_eq!(out.rules, RuleNode::Leaf { target: "y".into(), class: 0 });
    }

    #[test]
    fn tree_rejects_bad_nodes() {
        let params = CompilerParams::default();
        let out_of_range = tree(vec![1, -1, -1], vec![7, -1, -1], vec![0, -2, -2]);
        assert!(matches!(
            extract(&Classifier::DecisionTree(out_of_range), &names(1), "y", &params),
            Err(ExtractError::InvalidNode { node: 0, .. })
        ));

        let cycle = tree(vec![1, 0], vec![1, 0], vec![0, 0]);
        assert!(matches!(
            extract(&Classifier::DecisionTree(cycle), &names(1), "y", &params),
            Err(ExtractError::InvalidNode { .. })
        ));

        let bad_feature = tree(vec![1, -1, -1], vec![2, -1, -1], vec![4, -2, -2]);
        assert!(matches!(
            extract(&Classifier::DecisionTree(bad_feature), &names(2), "y", &params),
            Err(ExtractError::InvalidNode { node: 0, .. })
        ));

        let mut ragged = tree(vec![-1], vec![-1], vec![-2]);
        ragged.threshold.clear();
        assert!(matches!(
            extract(&Classifier::DecisionTree(ragged), &names(1), "y", &params),
            Err(ExtractError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn mlp_layers_and_offset() {
        let mlp = Mlp {
            coefs: vec![vec![vec![1.0, -1.0], vec![2.0, 0.5]], vec![vec![1.0], vec![1.0]]],
            intercepts: vec![vec![0.0, 1.0], vec![-0.25]],
            activation: Activation::Relu,
            out_activation: Activation::Logistic,
        };
        let out = extract(&Classifier::Mlp(mlp), &names(2), "target", &CompilerParams::default()).unwrap();
        let lines = assigns(&out.rules);
        assert_eq!(lines[0], "hidden_0_0 = f0 * 1.0000 + f1 * 2.0000");
        assert_eq!(lines[2], "hidden_0_1 = f0 * -1.0000 + f1 * 0.5000");
        assert_eq!(lines[4], "target = hidden_0_0 * 1.0000 + hidden_0_1 * 1.0000");
        assert_eq!(lines[6], "target = 1 / (1 + 2.718281828459045 ** -target)");
        assert_eq!(lines.last().map(String::as_str), Some("target = target + 0.5000"));
        // One relu clamp per hidden neuron.
        assert_eq!(out.rules.n_branches(), 2);
    }

    #[test]
    fn mlp_offset_can_be_disabled() {
        let mlp = Mlp {
            coefs: vec![vec![vec![2.0]]],
            intercepts: vec![vec![1.0]],
            activation: Activation::Relu,
            out_activation: Activation::Identity,
        };
        let params = CompilerParams::default().with_mlp_output_offset(None);
        let out = extract(&Classifier::Mlp(mlp), &names(1), "t", &params).unwrap();
        assert_eq!(assigns(&out.rules), vec!["t = f0 * 2.0000", "t = t + 1.0000"]);
    }

    #[test]
    fn mlp_shape_and_activation_errors() {
        let params = CompilerParams::default();
        let wide_output = Mlp {
            coefs: vec![vec![vec![1.0, 1.0]]],
            intercepts: vec![vec![0.0, 0.0]],
            activation: Activation::Relu,
            out_activation: Activation::Identity,
        };
        assert!(matches!(
            extract(&Classifier::Mlp(wide_output), &names(1), "t", &params),
            Err(ExtractError::ShapeMismatch { expected: 1, got: 2, .. })
        ));

        let wrong_inputs = Mlp {
            coefs: vec![vec![vec![1.0]]],
            intercepts: vec![vec![0.0]],
            activation: Activation::Relu,
            out_activation: Activation::Identity,
        };
        assert!(matches!(
            extract(&Classifier::Mlp(wrong_inputs.clone()), &names(3), "t", &params),
            Err(ExtractError::ShapeMismatch { expected: 3, got: 1, .. })
        ));

        let tanh = Mlp {
            activation: Activation::Unsupported("tanh".into()),
            ..wrong_inputs
        };
        assert!(matches!(
            extract(&Classifier::Mlp(tanh), &names(1), "t", &params),
            Err(ExtractError::UnsupportedActivation(name)) if name == "tanh"
        ));
    }

    #[test]
    fn scaler_renames_and_guards_zero_scale() {
        let scaler = Classifier::Scaler(Scaler {
            mean: Some(vec![1.0, 2.0]),
            scale: Some(vec![4.0, 0.0]),
        });
        let out = extract(&scaler, &names(2), "t", &CompilerParams::default()).unwrap();
        assert_eq!(out.features, vec!["scaled_f0", "scaled_f1"]);
        assert_eq!(
            assigns(&out.rules),
            vec![
                "scaled_f0 = (f0 - 1.0000) * 0.2500",
                "scaled_f1 = (f1 - 2.0000) * 1.0000",
            ]
        );
    }

    #[test]
    fn pipeline_carries_renamed_features() {
        let pipeline = Classifier::Pipeline(Pipeline {
            steps: vec![
                Classifier::Scaler(Scaler {
                    mean: None,
                    scale: Some(vec![2.0]),
                }),
                Classifier::Linear(Linear {
                    coef: vec![3.0],
                    intercept: 0.0,
                }),
            ],
        });
        let out = extract(&pipeline, &names(1), "t", &CompilerParams::default()).unwrap();
        assert_eq!(
            assigns(&out.rules),
            vec![
                "scaled_f0 = (f0 - 0.0000) * 0.5000",
                "t = scaled_f0 * 3.0000",
                "t = t + 0.0000",
            ]
        );
    }

    #[test]
    fn empty_pipeline_and_unknown_kind_fail() {
        let params = CompilerParams::default();
        let empty = Classifier::Pipeline(Pipeline { steps: Vec::new() });
        assert!(matches!(
            extract(&empty, &names(1), "t", &params),
            Err(ExtractError::EmptyPipeline)
        ));

        let unknown = Classifier::Unsupported { kind: "svm_rbf".into() };
        assert!(matches!(
            extract(&unknown, &names(1), "t", &params),
            Err(ExtractError::UnsupportedKind(kind)) if kind == "svm_rbf"
        ));
    }
}
