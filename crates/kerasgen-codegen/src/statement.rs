//! Translation of a single layer entry into one Python statement.

use kerasgen_core::{LayerEntry, NamespaceTable};

use crate::error::{GenerateError, GenerateResult};
use crate::literal::LiteralPolicy;

/// Builds `name = namespace.Type(args)(input)` statements.
///
/// Holds only borrowed, immutable state, so one builder can be used from
/// several threads at once.
#[derive(Debug, Clone, Copy)]
pub struct StatementBuilder<'a> {
    table: &'a NamespaceTable,
    policy: LiteralPolicy,
}

impl<'a> StatementBuilder<'a> {
    /// Create a builder using the legacy literal rules.
    pub fn new(table: &'a NamespaceTable) -> Self {
        Self {
            table,
            policy: LiteralPolicy::default(),
        }
    }

    /// Use a different literal policy.
    pub fn with_policy(mut self, policy: LiteralPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Build the statement for `entry`, without a line terminator.
    pub fn build(&self, entry: &LayerEntry) -> GenerateResult<String> {
        let namespace =
            self.table
                .resolve(&entry.category)
                .ok_or_else(|| GenerateError::UnknownCategory {
                    layer: entry.name.clone(),
                    category: entry.category.clone(),
                })?;

        let args = entry
            .config
            .iter()
            .map(|(param, value)| self.policy.format_argument(&entry.name, param, value))
            .collect::<GenerateResult<Vec<_>>>()?
            .join(", ");

        let mut statement = format!("{} = {}.{}({})", entry.name, namespace, entry.layer_type, args);
        if let Some(input) = &entry.input {
            statement.push('(');
            statement.push_str(input);
            statement.push(')');
        }

        check_single_line(entry, &statement)?;
        Ok(statement)
    }
}

fn check_single_line(entry: &LayerEntry, statement: &str) -> GenerateResult<()> {
    if !statement.contains(['\n', '\r']) {
        return Ok(());
    }

    let field = if entry.name.contains(['\n', '\r']) {
        "name".to_string()
    } else if entry.layer_type.contains(['\n', '\r']) {
        "type".to_string()
    } else if entry.input.as_deref().is_some_and(|i| i.contains(['\n', '\r'])) {
        "input".to_string()
    } else {
        entry
            .config
            .iter()
            .find(|(_, v)| v.raw.contains(['\n', '\r']))
            .map(|(k, _)| format!("config.{}", k))
            .unwrap_or_else(|| "config".to_string())
    };

    Err(GenerateError::LineBreak {
        layer: entry.name.clone(),
        field,
    })
}
