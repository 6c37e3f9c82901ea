use crate::biword::BiwordSnapshot;
use crate::document::{DocMeta, GrowthPoint};
use crate::index_set::{IndexSet, IndexSnapshot};
use crate::inverted::InvertedSnapshot;
use crate::positional::PositionalSnapshot;
use crate::tokenizer::NormalizerConfig;
use crate::vocabulary::TermEntry;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Json,
    Bincode,
}

impl SnapshotFormat {
    fn extension(self) -> &'static str {
        match self {
            SnapshotFormat::Json => "json",
            SnapshotFormat::Bincode => "bin",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub created_at: String,
    pub version: u32,
    pub format: SnapshotFormat,
    pub normalizer: NormalizerConfig,
}

pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn growth(&self) -> PathBuf { self.root.join("growth.json") }
    fn structure(&self, name: &str, format: SnapshotFormat) -> PathBuf {
        self.root.join(format!("{name}.{}", format.extension()))
    }
}

fn write_structure<T: Serialize>(path: &Path, value: &T, format: SnapshotFormat) -> Result<()> {
    let mut w = BufWriter::new(File::create(path).with_context(|| format!("creating {}", path.display()))?);
    match format {
        SnapshotFormat::Json => serde_json::to_writer(&mut w, value)?,
        SnapshotFormat::Bincode => bincode::serialize_into(&mut w, value)?,
    }
    w.flush()?;
    Ok(())
}

fn read_structure<T: DeserializeOwned>(path: &Path, format: SnapshotFormat) -> Result<T> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    BufReader::new(f).read_to_end(&mut buf)?;
    let value = match format {
        SnapshotFormat::Json => serde_json::from_slice(&buf).with_context(|| format!("parsing {}", path.display()))?,
        SnapshotFormat::Bincode => bincode::deserialize(&buf).with_context(|| format!("decoding {}", path.display()))?,
    };
    Ok(value)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("no index found at {}", paths.root.display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    anyhow::ensure!(
        meta.version == SNAPSHOT_VERSION,
        "unsupported snapshot version {} (expected {SNAPSHOT_VERSION})",
        meta.version
    );
    Ok(meta)
}

/// Writes every structure of the snapshot plus `meta.json` under `paths.root`.
pub fn save_snapshot(paths: &IndexPaths, snapshot: &IndexSnapshot, format: SnapshotFormat, created_at: String) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_structure(&paths.structure("documents", format), &snapshot.documents, format)?;
    write_structure(&paths.structure("vocabulary", format), &snapshot.vocabulary, format)?;
    write_structure(&paths.structure("inverted", format), &snapshot.inverted, format)?;
    write_structure(&paths.structure("positional", format), &snapshot.positional, format)?;
    write_structure(&paths.structure("biword", format), &snapshot.biword, format)?;
    let meta = MetaFile {
        num_docs: snapshot.documents.len() as u32,
        created_at,
        version: SNAPSHOT_VERSION,
        format,
        normalizer: snapshot.normalizer,
    };
    save_meta(paths, &meta)?;
    tracing::debug!(root = %paths.root.display(), ?format, "saved index snapshot");
    Ok(())
}

pub fn load_snapshot(paths: &IndexPaths) -> Result<IndexSnapshot> {
    let meta = load_meta(paths)?;
    let format = meta.format;
    let documents: Vec<DocMeta> = read_structure(&paths.structure("documents", format), format)?;
    let vocabulary: Vec<TermEntry> = read_structure(&paths.structure("vocabulary", format), format)?;
    let inverted: InvertedSnapshot = read_structure(&paths.structure("inverted", format), format)?;
    let positional: PositionalSnapshot = read_structure(&paths.structure("positional", format), format)?;
    let biword: BiwordSnapshot = read_structure(&paths.structure("biword", format), format)?;
    anyhow::ensure!(
        documents.len() as u32 == meta.num_docs,
        "meta.json declares {} documents but {} were stored",
        meta.num_docs,
        documents.len()
    );
    Ok(IndexSnapshot { normalizer: meta.normalizer, documents, vocabulary, inverted, positional, biword })
}

/// The growth curve needs token sequences, so it is computed at build time and
/// stored next to the snapshot.
pub fn save_growth(paths: &IndexPaths, growth: &[GrowthPoint]) -> Result<()> {
    create_dir_all(&paths.root)?;
    write_structure(&paths.growth(), &growth, SnapshotFormat::Json)
}

/// `None` for snapshots written without a growth curve.
pub fn load_growth(paths: &IndexPaths) -> Result<Option<Vec<GrowthPoint>>> {
    let path = paths.growth();
    if !path.exists() {
        return Ok(None);
    }
    read_structure(&path, SnapshotFormat::Json).map(Some)
}

/// Loads and validates a stored snapshot into a queryable [`IndexSet`].
pub fn load_index(paths: &IndexPaths) -> Result<IndexSet> {
    let snapshot = load_snapshot(paths)?;
    let index = IndexSet::import(snapshot)?;
    Ok(index)
}
