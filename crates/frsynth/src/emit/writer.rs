//! Program text writer.

use std::io::{self, Write};

use crate::classifier::{Extraction, RuleNode, Statement, format_literal};
use crate::config::CompilerParams;
use crate::fit::{FitDescriptor, StepFit};
use crate::model::{ModelNode, PopulationModel};

use super::predicate::Predicate;

/// Writes `popModel()` and `F()` blocks into any [`Write`] destination.
///
/// Blocks are written as they are requested, so both may target one
/// destination in sequence; consecutive blocks are separated by a blank line.
pub struct ProgramWriter<W: Write> {
    out: W,
    population_precision: usize,
    rule_precision: usize,
    wrote_block: bool,
}

impl<W: Write> ProgramWriter<W> {
    pub fn new(out: W, params: &CompilerParams) -> Self {
        Self {
            out,
            population_precision: params.decimal_precision as usize,
            rule_precision: params.literal_precision,
            wrote_block: false,
        }
    }

    /// Write the population model, followed by the sensitive-attribute and
    /// qualification declarations.
    pub fn write_population(
        &mut self,
        model: &PopulationModel,
        sensitive: &[Predicate],
        qualified: &[Predicate],
    ) -> io::Result<()> {
        self.begin_block("popModel")?;
        for root in model.roots() {
            self.write_node(root, 1)?;
        }
        for predicate in sensitive {
            let predicate = predicate.render(self.population_precision);
            self.line(1, format_args!("sensitiveAttribute({predicate})"))?;
        }
        for predicate in qualified {
            let predicate = predicate.render(self.population_precision);
            self.line(1, format_args!("qualified({predicate})"))?;
        }
        Ok(())
    }

    /// Write the classifier procedure, followed by the fairness targets.
    pub fn write_rules(&mut self, extraction: &Extraction, fairness: &[Predicate]) -> io::Result<()> {
        self.begin_block("F")?;
        self.write_rule(&extraction.rules, 1)?;
        for predicate in fairness {
            let predicate = predicate.render(self.rule_precision);
            self.line(1, format_args!("fairnessTarget({predicate})"))?;
        }
        Ok(())
    }

    /// Flush and return the destination.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn begin_block(&mut self, name: &str) -> io::Result<()> {
        if self.wrote_block {
            writeln!(self.out)?;
        }
        self.wrote_block = true;
        writeln!(self.out, "def {name}():")
    }

    fn line(&mut self, indent: usize, content: std::fmt::Arguments<'_>) -> io::Result<()> {
        for _ in 0..indent {
            self.out.write_all(b"\t")?;
        }
        self.out.write_fmt(content)?;
        self.out.write_all(b"\n")
    }

    // =========================================================================
    // Population model
    // =========================================================================

    fn write_node(&mut self, node: &ModelNode, indent: usize) -> io::Result<()> {
        let fit = render_fit(node.fit(), self.population_precision);
        self.line(indent, format_args!("{} = {fit}", node.name()))?;

        for partition in node.partitions() {
            let last = partition.branches().len().saturating_sub(1);
            for (i, branch) in partition.branches().iter().enumerate() {
                if i == last {
                    self.line(indent, format_args!("else:"))?;
                } else {
                    let keyword = if i == 0 { "if" } else { "elif" };
                    let threshold = format_literal(branch.range().upper(), self.population_precision);
                    self.line(indent, format_args!("{keyword} {} <= {threshold}:", node.name()))?;
                }
                for child in branch.nodes() {
                    self.write_node(child, indent + 1)?;
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Rules
    // =========================================================================

    fn write_rule(&mut self, rule: &RuleNode, indent: usize) -> io::Result<()> {
        match rule {
            RuleNode::Leaf { target, class } => self.line(indent, format_args!("{target} = {class}")),
            RuleNode::Branch {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = condition.render(self.rule_precision);
                self.line(indent, format_args!("if {condition}:"))?;
                self.write_rule(then_branch, indent + 1)?;
                if let Some(else_branch) = else_branch {
                    self.line(indent, format_args!("else:"))?;
                    self.write_rule(else_branch, indent + 1)?;
                }
                Ok(())
            }
            RuleNode::Sequence(statements) => {
                for statement in statements {
                    match statement {
                        Statement::Assign { name, expr } => {
                            let expr = expr.render(self.rule_precision);
                            self.line(indent, format_args!("{name} = {expr}"))?;
                        }
                        Statement::Rule(rule) => self.write_rule(rule, indent)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// `gaussian(mean, std)` or `step([(lo, hi, p), ...])`.
pub fn render_fit(fit: &FitDescriptor, precision: usize) -> String {
    let kind = fit.kind();
    match fit {
        FitDescriptor::Gaussian { mean, std } => format!(
            "{kind}({}, {})",
            format_literal(*mean, precision),
            format_literal(*std, precision)
        ),
        FitDescriptor::Step(step) => format!("{kind}([{}])", render_buckets(step, precision)),
    }
}

fn render_buckets(step: &StepFit, precision: usize) -> String {
    let edges = step.edges();
    let buckets: Vec<String> = step
        .probability_units()
        .iter()
        .enumerate()
        .map(|(i, &units)| {
            format!(
                "({}, {}, {})",
                format_literal(edges[i], precision),
                format_literal(edges[i + 1], precision),
                format_units(units, step.precision())
            )
        })
        .collect();
    buckets.join(", ")
}

/// Fixed-decimal text of `units * 10^-precision`, exact for any unit count.
fn format_units(units: u64, precision: u32) -> String {
    let scale = 10u64.pow(precision);
    format!(
        "{}.{:0width$}",
        units / scale,
        units % scale,
        width = precision as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{Comparison, Condition, Expr};

    #[test]
    fn units_render_exactly() {
        assert_eq!(format_units(333_334, 6), "0.333334");
        assert_eq!(format_units(1_000_000, 6), "1.000000");
        assert_eq!(format_units(5, 3), "0.005");
    }

    #[test]
    fn step_fit_text() {
        let step = StepFit::from_probabilities(vec![0.0, 1.5, 3.0], &[0.25, 0.75], 6);
        assert_eq!(
            render_fit(&FitDescriptor::Step(step), 6),
            "step([(0.000000, 1.500000, 0.250000), (1.500000, 3.000000, 0.750000)])"
        );
        let gaussian = FitDescriptor::Gaussian { mean: 25.0, std: 10.0 };
        assert_eq!(render_fit(&gaussian, 2), "gaussian(25.00, 10.00)");
    }

    #[test]
    fn rules_indent_with_tabs() {
        let rules = RuleNode::Branch {
            condition: Condition::new(Expr::var("f0"), Comparison::Gt, Expr::Const(1.0)),
            then_branch: Box::new(RuleNode::Leaf {
                target: "t".into(),
                class: 1,
            }),
            else_branch: Some(Box::new(RuleNode::Leaf {
                target: "t".into(),
                class: 0,
            })),
        };
        let extraction = Extraction {
            features: vec!["f0".into()],
            rules,
        };
        let mut writer = ProgramWriter::new(Vec::new(), &CompilerParams::default());
        writer
            .write_rules(&extraction, &[Predicate::new("t", Comparison::Gt, 0.5)])
            .unwrap();
        let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "def F():\n\tif f0 > 1.0000:\n\t\tt = 1\n\telse:\n\t\tt = 0\n\tfairnessTarget(t > 0.5000)\n"
        );
    }
}
