//! # Artifact Files
//!
//! JSON reads and atomic JSON writes for the files the CLI consumes and
//! publishes. A write goes to a temporary sibling first and is renamed over
//! the target, so a reader never sees a half-written artifact.
//!
//! Publication of a commitment is all or nothing: proof checkpoints land in
//! a staging sibling of the proofs file, and the proof book and root record
//! reach their real paths only once every proof exists.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use balance_merkle::{CheckpointSink, MerkleError, ProofBatch, ProofBook, Progress, RootRecord};

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Serialize `value` as pretty JSON and atomically replace `path` with it.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let tmp = temp_path(path);
    let result = write_file(&tmp, value).and_then(|()| {
        fs::rename(&tmp, path).with_context(|| {
            format!("failed to move {} into place at {}", tmp.display(), path.display())
        })
    });
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn write_file<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    writer
        .write_all(b"\n")
        .and_then(|()| writer.flush())
        .with_context(|| format!("failed to write {}", path.display()))?;
    writer
        .get_ref()
        .sync_all()
        .with_context(|| format!("failed to sync {}", path.display()))
}

/// `dir/name.json` -> `dir/.name.json.tmp`
fn temp_path(path: &Path) -> PathBuf {
    hidden_sibling(path, "tmp")
}

/// Where checkpoints of the proof book at `proofs` are written:
/// `dir/name.json` -> `dir/.name.json.partial`.
pub fn staging_path(proofs: &Path) -> PathBuf {
    hidden_sibling(proofs, "partial")
}

fn hidden_sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{suffix}"))
}

fn remove_quietly(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}

/// The two files a commitment is published as.
#[derive(Debug, Clone, Copy)]
pub struct OutputPaths<'a> {
    pub root: &'a Path,
    pub proofs: &'a Path,
}

/// Run `batch`, then publish the complete proof book and the root record.
///
/// `sink` receives the checkpoints; the CLI points it at
/// [`staging_path`]`(out.proofs)`. Neither output path is touched until the
/// batch has succeeded, the proof book goes out before the root, and a root
/// write failure takes the new proof book back down. The staging file is
/// removed on every outcome.
pub fn publish_commitment<S: CheckpointSink>(
    batch: &ProofBatch<'_>,
    record: &RootRecord,
    out: OutputPaths<'_>,
    sink: &mut S,
) -> Result<ProofBook> {
    let result = run_and_publish(batch, record, out, sink);
    remove_quietly(&staging_path(out.proofs));
    result
}

fn run_and_publish<S: CheckpointSink>(
    batch: &ProofBatch<'_>,
    record: &RootRecord,
    out: OutputPaths<'_>,
    sink: &mut S,
) -> Result<ProofBook> {
    let book = batch.run(sink).context("failed to generate proofs")?;

    write_json_atomic(out.proofs, &book)?;
    if let Err(e) = write_json_atomic(out.root, record) {
        remove_quietly(out.proofs);
        return Err(e);
    }
    Ok(book)
}

/// Rewrites the partial proof book to disk at every checkpoint.
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CheckpointSink for FileCheckpoint {
    fn checkpoint(&mut self, progress: Progress, book: &ProofBook) -> balance_merkle::Result<()> {
        write_json_atomic(&self.path, book)
            .map_err(|e| MerkleError::Checkpoint(format!("{e:#}")))?;
        tracing::info!(
            processed = progress.processed,
            total = progress.total,
            path = %self.path.display(),
            "proof checkpoint written"
        );
        Ok(())
    }
}
