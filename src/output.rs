use crate::pipeline::OutputDataset;
use anyhow::{Context, Result};
use rand::{distributions::Alphanumeric, Rng};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Serializes the dataset as pretty JSON and swaps it into place atomically,
/// so an interrupted run never leaves a truncated artifact for the client.
pub fn write_atomic(path: &Path, dataset: &OutputDataset) -> Result<()> {
    let data = serde_json::to_string_pretty(dataset).context("Failed to serialize dataset")?;

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    fs::create_dir_all(&parent).with_context(|| format!("Create output dir: {parent:?}"))?;

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(char::from)
        .collect();
    let tmp = parent.join(format!(
        ".{}.tmp.{suffix}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("stations.json")
    ));

    {
        let mut file = fs::File::create(&tmp).with_context(|| format!("Create temp file: {tmp:?}"))?;
        file.write_all(data.as_bytes())
            .with_context(|| format!("Write temp file: {tmp:?}"))?;
        file.sync_all()
            .with_context(|| format!("Sync temp file: {tmp:?}"))?;
    }

    fs::rename(&tmp, path).with_context(|| format!("Atomic rename to: {path:?}"))?;
    Ok(())
}
