//! Assembly of a full script from a model spec and a compile spec.
//!
//! Statement order is fixed: import preamble, one statement per layer in
//! list order, the model assembly statement, the compile statement. Layers
//! are never reordered; references are only checked against identifiers
//! declared earlier in the list.

use std::collections::HashSet;

use tracing::{debug, info};

use kerasgen_core::{CompileSpec, ModelSpec, NamespaceTable};

use crate::error::{GenerateError, GenerateResult};
use crate::literal::{python_string, LiteralPolicy};
use crate::script::Script;
use crate::statement::StatementBuilder;

/// Name of the model variable in the generated script.
const MODEL_VAR: &str = "model";

/// Generates scripts against a fixed namespace table.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    table: NamespaceTable,
    policy: LiteralPolicy,
}

impl CodeGenerator {
    /// Create a generator for the given table with the legacy literal rules.
    pub fn new(table: NamespaceTable) -> Self {
        Self {
            table,
            policy: LiteralPolicy::default(),
        }
    }

    /// Generator for the TensorFlow table.
    pub fn tensorflow() -> Self {
        Self::new(NamespaceTable::tensorflow())
    }

    /// Use a different literal policy.
    pub fn with_policy(mut self, policy: LiteralPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> LiteralPolicy {
        self.policy
    }

    /// Generate the full script.
    pub fn generate(&self, model: &ModelSpec, compile: &CompileSpec) -> GenerateResult<Script> {
        validate_references(model)?;

        let mut lines = Vec::with_capacity(model.layers.len() + 5);
        lines.push(self.table.preamble.clone());
        lines.push(String::new());
        lines.extend(self.layer_statements(model)?);
        lines.push(self.model_statement(model)?);
        lines.push(String::new());
        lines.push(self.compile_statement(compile)?);

        let script = Script::from_lines(lines);
        info!(
            layers = model.layers.len(),
            bytes = script.byte_len(),
            policy = %self.policy,
            "Script assembled"
        );
        Ok(script)
    }

    /// One statement per layer, in list order.
    pub fn layer_statements(&self, model: &ModelSpec) -> GenerateResult<Vec<String>> {
        let builder = StatementBuilder::new(&self.table).with_policy(self.policy);
        model
            .layers
            .iter()
            .map(|entry| {
                let statement = builder.build(entry)?;
                debug!(layer = %entry.name, %statement, "Layer statement built");
                Ok(statement)
            })
            .collect()
    }

    /// `model = tf.keras.Model(inputs=..., outputs=...)`
    pub fn model_statement(&self, model: &ModelSpec) -> GenerateResult<String> {
        check_single_line(MODEL_VAR, "input", &model.input)?;
        check_single_line(MODEL_VAR, "output", &model.output)?;
        Ok(format!(
            "{} = {}.Model(inputs={}, outputs={})",
            MODEL_VAR, self.table.model_namespace, model.input, model.output
        ))
    }

    /// `model.compile(optimizer=..., loss="...", metrics=[...])`
    ///
    /// `loss` and the metric names are emitted as escaped string literals.
    pub fn compile_statement(&self, compile: &CompileSpec) -> GenerateResult<String> {
        check_single_line("compile", "optimizer", &compile.optimizer)?;
        check_single_line("compile", "loss", &compile.loss)?;
        for (i, metric) in compile.metrics.iter().enumerate() {
            check_single_line("compile", &format!("metrics[{}]", i), metric)?;
        }

        let optimizer = format!(
            "{}.{}(lr={:.6})",
            self.table.optimizer_namespace, compile.optimizer, compile.learning_rate
        );
        let metrics = compile
            .metrics
            .iter()
            .map(|m| python_string(m))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "{}.compile(optimizer={}, loss={}, metrics=[{}])",
            MODEL_VAR,
            optimizer,
            python_string(&compile.loss),
            metrics
        ))
    }
}

fn check_single_line(owner: &str, field: &str, value: &str) -> GenerateResult<()> {
    if value.contains(['\n', '\r']) {
        return Err(GenerateError::LineBreak {
            layer: owner.to_string(),
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Check that names are unique and every reference points backwards.
///
/// The declared input identifier is in scope from the start, and a layer may
/// rebind it (the usual `Input` layer does).
pub fn validate_references(model: &ModelSpec) -> GenerateResult<()> {
    let mut declared: HashSet<&str> = HashSet::new();
    declared.insert(model.input.as_str());
    let mut names: HashSet<&str> = HashSet::new();

    for entry in &model.layers {
        if let Some(input) = &entry.input {
            if !declared.contains(input.as_str()) {
                return Err(GenerateError::UnresolvedReference {
                    reference: input.clone(),
                    referenced_by: entry.name.clone(),
                });
            }
        }
        if !names.insert(entry.name.as_str()) {
            return Err(GenerateError::DuplicateName {
                name: entry.name.clone(),
            });
        }
        declared.insert(entry.name.as_str());
    }

    if !declared.contains(model.output.as_str()) {
        return Err(GenerateError::UnresolvedReference {
            reference: model.output.clone(),
            referenced_by: "outputs".to_string(),
        });
    }

    Ok(())
}
