use crate::Engine;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_items: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

impl MetaFile {
    fn describe(engine: &Engine) -> Self {
        Self {
            num_items: engine.len() as u32,
            num_terms: engine.num_terms() as u32,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
            version: SNAPSHOT_VERSION,
        }
    }
}

/// Snapshot directory layout: `engine.bin` (bincode) next to `meta.json`.
pub struct SnapshotPaths {
    pub root: PathBuf,
}

impl SnapshotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn engine(&self) -> PathBuf { self.root.join("engine.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write the fitted engine and its description. Metadata goes last so a
/// half-written directory never looks loadable.
pub fn save_snapshot(paths: &SnapshotPaths, engine: &Engine) -> Result<MetaFile> {
    create_dir_all(&paths.root)?;
    fs::write(paths.engine(), bincode::serialize(engine)?)
        .with_context(|| format!("writing {}", paths.engine().display()))?;

    let meta = MetaFile::describe(engine);
    fs::write(paths.meta(), serde_json::to_string_pretty(&meta)?)
        .with_context(|| format!("writing {}", paths.meta().display()))?;
    Ok(meta)
}

/// Load a snapshot, refusing versions this build does not understand or
/// engines that disagree with their metadata.
pub fn load_snapshot(paths: &SnapshotPaths) -> Result<(Engine, MetaFile)> {
    let raw = fs::read_to_string(paths.meta()).with_context(|| format!("reading {}", paths.meta().display()))?;
    let meta: MetaFile = serde_json::from_str(&raw)?;
    if meta.version != SNAPSHOT_VERSION {
        anyhow::bail!("unsupported snapshot version {} (expected {})", meta.version, SNAPSHOT_VERSION);
    }

    let bytes = fs::read(paths.engine()).with_context(|| format!("reading {}", paths.engine().display()))?;
    let engine: Engine = bincode::deserialize(&bytes)?;
    if engine.len() as u32 != meta.num_items {
        anyhow::bail!("snapshot holds {} items but meta.json records {}", engine.len(), meta.num_items);
    }
    tracing::info!(num_items = meta.num_items, created_at = %meta.created_at, "snapshot loaded");
    Ok((engine, meta))
}
