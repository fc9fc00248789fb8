//! End-to-end program compilation.
//!
//! Loads nothing and prints nothing: callers hand in a [`Dataset`] and a
//! [`Classifier`], and get back the program text or a written file.

use std::fs;
use std::path::Path;

use crate::classifier::{Classifier, extract};
use crate::config::CompilerParams;
use crate::dataset::{Dataset, DatasetError};
use crate::emit::{Predicate, ProgramWriter};
use crate::error::Result;
use crate::model::compile;

/// Names and declarations of one program.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileRequest {
    /// Variable the classifier assigns.
    pub target: String,
    /// Classifier inputs in order; `None` uses every dataset column except
    /// the target.
    pub features: Option<Vec<String>>,
    pub sensitive: Vec<Predicate>,
    pub qualified: Vec<Predicate>,
    pub fairness: Vec<Predicate>,
    pub params: CompilerParams,
}

impl CompileRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            features: None,
            sensitive: Vec::new(),
            qualified: Vec::new(),
            fairness: Vec::new(),
            params: CompilerParams::default(),
        }
    }

    pub fn with_features<S: Into<String>>(mut self, features: impl IntoIterator<Item = S>) -> Self {
        self.features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_sensitive(mut self, predicate: Predicate) -> Self {
        self.sensitive.push(predicate);
        self
    }

    pub fn with_qualified(mut self, predicate: Predicate) -> Self {
        self.qualified.push(predicate);
        self
    }

    pub fn with_fairness(mut self, predicate: Predicate) -> Self {
        self.fairness.push(predicate);
        self
    }

    pub fn with_params(mut self, params: CompilerParams) -> Self {
        self.params = params;
        self
    }
}

/// Compile `dataset` and `classifier` into program text.
///
/// The population model covers every dataset column except the target,
/// which the classifier block assigns. `popModel()` is written first.
///
/// # Errors
///
/// Returns [`Error`](crate::Error) if a feature is not a dataset column, the
/// population model cannot be compiled or the classifier cannot be unrolled.
pub fn compile_program(dataset: &Dataset, classifier: &Classifier, request: &CompileRequest) -> Result<String> {
    let _span = tracing::info_span!("compile program", target = %request.target).entered();
    request.params.validate()?;

    let population = match dataset.index_of(&request.target) {
        Some(_) => dataset.without_column(&request.target)?,
        None => dataset.clone(),
    };
    let features = match &request.features {
        Some(features) => {
            if let Some(unknown) = features.iter().find(|f| population.index_of(f).is_none()) {
                return Err(DatasetError::UnknownColumn(unknown.clone()).into());
            }
            features.clone()
        }
        None => population.names().to_vec(),
    };
    for predicate in request.sensitive.iter().chain(&request.qualified) {
        if population.index_of(&predicate.attribute).is_none() {
            tracing::warn!(attribute = %predicate.attribute, "predicate names no modeled column");
        }
    }

    let model = compile(&population, &request.params)?;
    let extraction = extract(classifier, &features, &request.target, &request.params)?;
    tracing::info!(
        roots = model.roots().len(),
        depth = model.depth(),
        rule_branches = extraction.rules.n_branches(),
        "program compiled"
    );

    let mut writer = ProgramWriter::new(Vec::new(), &request.params);
    writer.write_population(&model, &request.sensitive, &request.qualified)?;
    writer.write_rules(&extraction, &request.fairness)?;
    let bytes = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Compile and write the program to `path`.
///
/// The text is rendered in memory first, so a failed compilation leaves no
/// file behind.
///
/// # Errors
///
/// See [`compile_program`]; write failures are reported as
/// [`Error::Io`](crate::Error::Io).
pub fn compile_to_path(
    dataset: &Dataset,
    classifier: &Classifier,
    request: &CompileRequest,
    path: impl AsRef<Path>,
) -> Result<()> {
    let program = compile_program(dataset, classifier, request)?;
    let path = path.as_ref();
    fs::write(path, program)?;
    tracing::info!(path = %path.display(), "program written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::classifier::{ExtractError, Linear};

    fn dataset() -> Dataset {
        Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ("b", vec![5.0, 3.0, 4.0, 1.0, 2.0]),
            ("y", vec![0.0, 1.0, 0.0, 1.0, 1.0]),
        ])
        .unwrap()
    }

    #[test]
    fn target_is_not_modeled() {
        let clf = Classifier::Linear(Linear {
            coef: vec![1.0, 1.0],
            intercept: 0.0,
        });
        let text = compile_program(&dataset(), &clf, &CompileRequest::new("y")).unwrap();
        let (population, rules) = text.split_once("\n\ndef F():\n").unwrap();
        assert!(population.starts_with("def popModel():\n"));
        assert!(!population.contains("\ty ="));
        assert!(rules.starts_with("\ty = a * 1.0000 + b * 1.0000\n"));
    }

    #[test]
    fn unknown_feature_is_rejected() {
        let clf = Classifier::Linear(Linear {
            coef: vec![1.0],
            intercept: 0.0,
        });
        let request = CompileRequest::new("y").with_features(["zz"]);
        assert!(matches!(
            compile_program(&dataset(), &clf, &request),
            Err(Error::Dataset(DatasetError::UnknownColumn(name))) if name == "zz"
        ));
    }

    #[test]
    fn extraction_errors_surface() {
        let clf = Classifier::Unsupported { kind: "knn".into() };
        assert!(matches!(
            compile_program(&dataset(), &clf, &CompileRequest::new("y")),
            Err(Error::Extract(ExtractError::UnsupportedKind(_)))
        ));
    }
}
