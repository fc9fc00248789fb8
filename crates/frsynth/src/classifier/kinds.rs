//! Exported classifier descriptions.
//!
//! A classifier is a JSON object with a `"kind"` tag and the fitted arrays of
//! the corresponding scikit-learn estimator:
//!
//! ```json
//! { "kind": "linear", "coef": [[1.0, -2.0, 0.5]], "intercept": [3.0] }
//! ```
//!
//! Arrays that scikit-learn stores with a leading singleton axis (`coef_`,
//! `intercept_`, tree `value`) are accepted either nested or flat.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::error::ExtractError;

// =============================================================================
// Custom deserializers for scikit-learn array shapes
// =============================================================================

/// Flatten `[[a, b, ...]]` or `[a, b, ...]` into a vector.
fn deserialize_flat_vec<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let value = Value::deserialize(deserializer)?;
    let mut out = Vec::new();
    flatten_into(&value, &mut out).map_err(SerdeError::custom)?;
    Ok(out)
}

fn flatten_into(value: &Value, out: &mut Vec<f64>) -> Result<(), String> {
    match value {
        Value::Number(n) => {
            out.push(n.as_f64().ok_or_else(|| format!("invalid number {n}"))?);
            Ok(())
        }
        Value::Array(items) => items.iter().try_for_each(|item| flatten_into(item, out)),
        other => Err(format!("expected number or array, got {other}")),
    }
}

/// Accept a number or a single-element (possibly nested) array.
fn deserialize_scalar<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let value = Value::deserialize(deserializer)?;
    let mut flat = Vec::new();
    flatten_into(&value, &mut flat).map_err(SerdeError::custom)?;
    match flat.as_slice() {
        [single] => Ok(*single),
        _ => Err(SerdeError::custom(format!(
            "expected a single number, got {} values",
            flat.len()
        ))),
    }
}

/// Per-node class counts: `[n_nodes][n_outputs][n_classes]` or `[n_nodes][n_classes]`.
fn deserialize_node_counts<'de, D>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error as SerdeError;

    let nodes = Vec::<Value>::deserialize(deserializer)?;
    nodes
        .iter()
        .map(|node| {
            let mut counts = Vec::new();
            flatten_into(node, &mut counts).map(|_| counts)
        })
        .collect::<Result<_, _>>()
        .map_err(SerdeError::custom)
}

// =============================================================================
// Classifier kinds
// =============================================================================

/// Fitted decision tree in scikit-learn's parallel-array layout.
///
/// `children_left[i] == -1` marks node `i` as a leaf.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionTree {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    #[serde(deserialize_with = "deserialize_node_counts")]
    pub value: Vec<Vec<f64>>,
}

/// Linear decision function `coef . x + intercept` (e.g. a linear SVM).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Linear {
    #[serde(deserialize_with = "deserialize_flat_vec")]
    pub coef: Vec<f64>,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub intercept: f64,
}

/// Activation function of an MLP layer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Activation {
    Relu,
    Logistic,
    Identity,
    /// Anything else; rejected during extraction.
    Unsupported(String),
}

impl From<String> for Activation {
    fn from(name: String) -> Self {
        match name.as_str() {
            "relu" => Activation::Relu,
            "logistic" => Activation::Logistic,
            "identity" => Activation::Identity,
            _ => Activation::Unsupported(name),
        }
    }
}

fn default_activation() -> Activation {
    Activation::Relu
}

fn default_out_activation() -> Activation {
    Activation::Identity
}

/// Multi-layer perceptron.
///
/// `coefs[l]` is the `[n_in][n_out]` weight matrix of layer `l` and
/// `intercepts[l]` its `n_out` biases, as in scikit-learn's `coefs_` /
/// `intercepts_`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Mlp {
    pub coefs: Vec<Vec<Vec<f64>>>,
    pub intercepts: Vec<Vec<f64>>,
    #[serde(default = "default_activation")]
    pub activation: Activation,
    #[serde(default = "default_out_activation")]
    pub out_activation: Activation,
}

/// Standardizing scaler `(x - mean) / scale`.
///
/// A missing `mean` centers nothing and a missing `scale` scales nothing.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scaler {
    #[serde(default)]
    pub mean: Option<Vec<f64>>,
    #[serde(default)]
    pub scale: Option<Vec<f64>>,
}

/// Stages applied in order; each stage sees the previous stage's outputs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Pipeline {
    pub steps: Vec<Classifier>,
}

/// A trained classifier of one of the supported kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Classifier {
    DecisionTree(DecisionTree),
    Linear(Linear),
    Mlp(Mlp),
    Scaler(Scaler),
    Pipeline(Pipeline),
    /// A loaded description of a kind with no extractor.
    Unsupported { kind: String },
}

impl Classifier {
    /// Name of the kind, as written in the `"kind"` tag.
    pub fn kind(&self) -> &str {
        match self {
            Classifier::DecisionTree(_) => "decision_tree",
            Classifier::Linear(_) => "linear",
            Classifier::Mlp(_) => "mlp",
            Classifier::Scaler(_) => "scaler",
            Classifier::Pipeline(_) => "pipeline",
            Classifier::Unsupported { kind } => kind,
        }
    }

    /// Parse a classifier description.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Json`] for malformed JSON or arrays of the wrong
    /// type. An unknown `"kind"` is not an error here; it loads as
    /// [`Classifier::Unsupported`].
    pub fn from_json_str(json: &str) -> Result<Self, ExtractError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a classifier description from a JSON file.
    ///
    /// # Errors
    ///
    /// See [`Classifier::from_json_str`]; I/O failures are reported as
    /// [`ExtractError::Io`].
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, ExtractError> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading classifier");
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl<'de> Deserialize<'de> for Classifier {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error as SerdeError;

        let value = Value::deserialize(deserializer)?;
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| SerdeError::custom("classifier needs a string 'kind' field"))?
            .to_string();

        let parsed = match kind.as_str() {
            "decision_tree" | "DecisionTreeClassifier" => DecisionTree::deserialize(value).map(Classifier::DecisionTree),
            "linear" | "LinearSVC" => Linear::deserialize(value).map(Classifier::Linear),
            "mlp" | "MLPClassifier" => Mlp::deserialize(value).map(Classifier::Mlp),
            "scaler" | "StandardScaler" => Scaler::deserialize(value).map(Classifier::Scaler),
            "pipeline" | "Pipeline" => Pipeline::deserialize(value).map(Classifier::Pipeline),
            _ => return Ok(Classifier::Unsupported { kind }),
        };
        parsed.map_err(|e| SerdeError::custom(format!("invalid '{kind}' classifier: {e}")))
    }
}
