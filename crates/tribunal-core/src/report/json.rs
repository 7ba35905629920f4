use crate::model::FinalVerdict;
use anyhow::Context;
use std::path::Path;

pub fn write_json(verdict: &FinalVerdict, out: &Path) -> anyhow::Result<()> {
    let body = serde_json::to_string_pretty(verdict)?;
    std::fs::write(out, body).with_context(|| format!("failed to write verdict to {}", out.display()))?;
    Ok(())
}
