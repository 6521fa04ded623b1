//! Generate command: request file in, script out.

use std::path::Path;

use anyhow::{Context, Result};
use humansize::{format_size, DECIMAL};
use kerasgen_codegen::{CodeGenerator, LiteralPolicy};
use kerasgen_ops::{Config, Project};
use tracing::info;

/// Generate a script from the request at `request`.
///
/// Writes to `output` when given, otherwise prints the script to stdout.
pub fn execute(
    config: &Config,
    request: &Path,
    output: Option<&Path>,
    policy: Option<LiteralPolicy>,
) -> Result<()> {
    let body = std::fs::read(request)
        .with_context(|| format!("Failed to read {}", request.display()))?;
    let project = Project::bind(&body)?;

    let policy = policy.unwrap_or(config.server.literal_policy);
    let generator = CodeGenerator::tensorflow().with_policy(policy);
    let script = project
        .generate_model(&generator)
        .with_context(|| format!("Failed to generate a script from {}", request.display()))?;

    match output {
        Some(path) => {
            std::fs::write(path, script.render())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(path = %path.display(), %policy, "Script written");
            eprintln!(
                "Wrote {} ({} lines, {})",
                path.display(),
                script.line_count(),
                format_size(script.byte_len(), DECIMAL)
            );
        }
        None => print!("{}", script),
    }

    Ok(())
}
