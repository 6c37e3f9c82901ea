use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use search_core::persist::{load_growth, load_index, load_meta, save_growth, save_snapshot, IndexPaths, SnapshotFormat};
use search_core::{
    CorrectionStrategy, CorrectorConfig, DocumentStore, IndexSet, Normalizer, NormalizerConfig, QueryPipeline,
    RawDocument, Stemming,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct InputDoc {
    id: String,
    #[serde(default)]
    title: Option<String>,
    body: String,
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query boolean/phrase retrieval indexes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Bincode,
}

impl From<Format> for SnapshotFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => SnapshotFormat::Json,
            Format::Bincode => SnapshotFormat::Bincode,
        }
    }
}

#[derive(clap::Args)]
struct NormalizerArgs {
    /// Full English pipeline: NFKC, lowercase, punctuation stripping, stopwords, stemming
    #[arg(long, default_value_t = false)]
    english: bool,
    #[arg(long, default_value_t = false)]
    lowercase: bool,
    #[arg(long, default_value_t = false)]
    strip_punctuation: bool,
    #[arg(long, default_value_t = false)]
    stopwords: bool,
    /// none | porter
    #[arg(long)]
    stemming: Option<Stemming>,
    #[arg(long, default_value_t = false)]
    nfkc: bool,
}

impl NormalizerArgs {
    fn config(&self) -> NormalizerConfig {
        if self.english {
            return NormalizerConfig::english();
        }
        NormalizerConfig {
            lowercase: self.lowercase,
            strip_punctuation: self.strip_punctuation,
            stopword_removal: self.stopwords,
            stemming: self.stemming.unwrap_or_default(),
            unicode_nfkc: self.nfkc,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index set from JSON/JSONL/TXT files or a directory of them
    Build {
        /// Input path (file or directory)
        #[arg(long)]
        input: String,
        /// Output index directory
        #[arg(long)]
        output: String,
        #[arg(long, value_enum, default_value_t = Format::Json)]
        format: Format,
        #[command(flatten)]
        normalizer: NormalizerArgs,
    },
    /// Evaluate queries against a stored index; reads stdin when no query is given
    Query {
        #[arg(long)]
        index: String,
        /// Spelling correction strategy: edit | jaccard (disabled when omitted)
        #[arg(long)]
        correction: Option<CorrectionStrategy>,
        #[arg(long, default_value_t = 2)]
        max_edit_distance: usize,
        #[arg(long, default_value_t = 2)]
        ngram_size: usize,
        #[arg(long, default_value_t = 0.3)]
        min_similarity: f64,
        #[arg(long, default_value_t = 1)]
        min_df: u32,
        /// Generate up to this many alternative spellings per query and report the best three
        #[arg(long, default_value_t = 0)]
        max_alternatives: usize,
        queries: Vec<String>,
    },
    /// Print index comparison, inverted statistics, growth and rank/frequency as JSON
    Stats {
        #[arg(long)]
        index: String,
        /// Number of rank/frequency rows to print
        #[arg(long, default_value_t = 50)]
        top: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, format, normalizer } => {
            build_index(&input, &output, format.into(), normalizer.config())
        }
        Commands::Query { index, correction, max_edit_distance, ngram_size, min_similarity, min_df, max_alternatives, queries } => {
            let corrector = correction.map(|strategy| CorrectorConfig {
                strategy,
                max_edit_distance,
                ngram_size,
                min_similarity,
                min_document_frequency: min_df,
                ..Default::default()
            });
            run_queries(&index, corrector, max_alternatives, queries)
        }
        Commands::Stats { index, top } => print_stats(&index, top),
    }
}

fn build_index(input: &str, output: &str, format: SnapshotFormat, config: NormalizerConfig) -> Result<()> {
    let input_path = Path::new(input);
    let out_paths = IndexPaths::new(output);

    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl" | "txt") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input_path.display());
    }

    let mut raw: Vec<RawDocument> = Vec::new();
    for file in files {
        match file.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => read_jsonl(&file, &mut raw)?,
            Some("txt") => read_txt(&file, &mut raw)?,
            _ => read_json(&file, &mut raw)?,
        }
    }
    tracing::info!(num_docs = raw.len(), "read documents");

    let store = DocumentStore::load(raw, &Normalizer::new(config));
    let index = IndexSet::build(&store, config)?;
    tracing::info!(num_docs = index.num_docs(), num_terms = index.vocabulary().len(), "built indexes");

    let created_at = time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "".into());
    save_snapshot(&out_paths, &index.export(), format, created_at)?;
    save_growth(&out_paths, &store.growth())?;

    tracing::info!(output, "index build complete");
    Ok(())
}

fn read_jsonl(file: &Path, out: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: InputDoc =
            serde_json::from_str(&line).with_context(|| format!("{}:{}", file.display(), n + 1))?;
        out.push(to_raw(doc));
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<RawDocument>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value =
        serde_json::from_reader(reader).with_context(|| format!("parsing {}", file.display()))?;
    match json {
        serde_json::Value::Array(arr) => {
            for v in arr {
                let doc: InputDoc = serde_json::from_value(v)?;
                out.push(to_raw(doc));
            }
        }
        serde_json::Value::Object(_) => {
            let doc: InputDoc = serde_json::from_value(json)?;
            out.push(to_raw(doc));
        }
        _ => tracing::warn!(file = %file.display(), "skipping json that is neither an object nor an array"),
    }
    Ok(())
}

fn read_txt(file: &Path, out: &mut Vec<RawDocument>) -> Result<()> {
    let text = fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let label = file.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string();
    out.push(RawDocument::new(label, text));
    Ok(())
}

fn to_raw(doc: InputDoc) -> RawDocument {
    // The title is searchable as part of the text.
    let text = match doc.title {
        Some(title) => format!("{title}\n{}", doc.body),
        None => doc.body,
    };
    RawDocument::new(doc.id, text)
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: String,
    evaluated: String,
    corrections: &'a [search_core::Correction],
    documents: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    alternatives: Vec<AlternativeOutput>,
}

#[derive(Serialize)]
struct AlternativeOutput {
    query: String,
    hits: usize,
}

const ALTERNATIVES_SHOWN: usize = 3;

fn run_queries(index: &str, corrector: Option<CorrectorConfig>, max_alternatives: usize, queries: Vec<String>) -> Result<()> {
    let paths = IndexPaths::new(index);
    let set = load_index(&paths)?;
    let mut pipeline = QueryPipeline::new(&set);
    if let Some(config) = corrector {
        pipeline = pipeline.with_correction(config)?;
    }

    let queries = if queries.is_empty() {
        io::stdin().lock().lines().collect::<io::Result<Vec<_>>>()?
    } else {
        queries
    };

    for query in queries.iter().filter(|q| !q.trim().is_empty()) {
        match pipeline.search(query) {
            Ok(result) => {
                let documents = result
                    .documents
                    .iter()
                    .filter_map(|id| set.document(id))
                    .map(|d| d.label.as_str())
                    .collect();
                let alternatives = if max_alternatives > 0 {
                    pipeline
                        .alternatives(query, max_alternatives)?
                        .into_iter()
                        .take(ALTERNATIVES_SHOWN)
                        .map(|(alt, hits)| AlternativeOutput { query: alt.to_string(), hits })
                        .collect()
                } else {
                    Vec::new()
                };
                let out = QueryOutput {
                    query: query.clone(),
                    evaluated: result.query.to_string(),
                    corrections: &result.corrections,
                    documents,
                    alternatives,
                };
                println!("{}", serde_json::to_string(&out)?);
            }
            // A bad query in a batch is reported and the rest still run.
            Err(e) => {
                tracing::warn!(query = %query, error = %e, "rejected query");
                println!("{}", serde_json::json!({ "query": query, "error": e.to_string() }));
            }
        }
    }
    Ok(())
}

fn print_stats(index: &str, top: usize) -> Result<()> {
    let paths = IndexPaths::new(index);
    let meta = load_meta(&paths)?;
    let set = load_index(&paths)?;
    let growth = load_growth(&paths)?;
    let comparison = set.comparison();

    let rank_frequency: Vec<_> = set
        .vocabulary()
        .rank_frequency()
        .into_iter()
        .take(top)
        .enumerate()
        .map(|(i, (term, freq))| serde_json::json!({ "rank": i + 1, "term": term, "frequency": freq }))
        .collect();

    let out = serde_json::json!({
        "meta": meta,
        "total_tokens": set.vocabulary().total_tokens(),
        "comparison": comparison,
        "ratios": {
            "biword_keys": comparison.biword_key_ratio(),
            "biword_postings": comparison.biword_postings_ratio(),
            "positional_entries": comparison.positional_entries_ratio(),
        },
        "inverted": set.inverted().stats(),
        "growth": growth,
        "rank_frequency": rank_frequency,
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}
