//! Axiom CLI - Command line interface for the extraction pipeline

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use axiom_deps::{find_cycles, resolve_dependencies, DependencyError, FunctionIndex};
use axiom_extract::{AnnotationScanner, ExtractConfig, ExtractError, Extractor};
use axiom_model::{AxiomCollection, PairingCollection};
use axiom_pairing::{resolve_placeholders, PairingError, PairingManifest, PairingResolver};
use axiom_storage::{
    AxiomRecord, GraphStore, HashingEmbedder, RedbStorage, StorageError, VectorFilter, VectorIndex,
};

#[derive(Parser)]
#[command(name = "axiom")]
#[command(about = "Extract axioms from K semantics rule files", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract axioms from every rule file under a directory
    Extract {
        /// Rule directory
        dir: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Extraction config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Function index of a lower layer to resolve calls against
        #[arg(long)]
        base_index: Option<PathBuf>,
        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,
    },
    /// Build a function index from extracted axioms
    Index {
        /// Axiom collection (JSON)
        axioms: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Detect pairings between functions of a rule directory
    Pairings {
        /// Rule directory
        dir: PathBuf,
        /// Axiom collection used to resolve function names to ids
        #[arg(long)]
        axioms: Option<PathBuf>,
        /// Pairing manifest (TOML)
        #[arg(long)]
        manifest: Option<PathBuf>,
        /// Extraction config (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Read `@axiom:` annotations from C and C++ sources
    Annotations {
        /// Source directory
        dir: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Load axioms and pairings into a graph database
    Load {
        #[arg(long)]
        db: PathBuf,
        /// Axiom collection (JSON)
        #[arg(long)]
        axioms: PathBuf,
        /// Pairing collection (JSON)
        #[arg(long)]
        pairings: Option<PathBuf>,
    },
    /// Query a graph database
    Query {
        #[arg(long)]
        db: PathBuf,
        #[command(flatten)]
        selector: QuerySelector,
    },
    /// Rank axioms by similarity to a text
    Search {
        /// Axiom collection (JSON)
        axioms: PathBuf,
        /// Search text
        text: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        function: Option<String>,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct QuerySelector {
    /// Axiom by id
    #[arg(long)]
    id: Option<String>,
    #[arg(long)]
    function: Option<String>,
    #[arg(long)]
    header: Option<String>,
    #[arg(long)]
    module: Option<String>,
    /// Dependency path from an axiom down to a foundation layer
    #[arg(long)]
    proof_chain: Option<String>,
    /// Axioms of a layer that depend on nothing stored
    #[arg(long)]
    ungrounded: Option<String>,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Pairing(#[from] PairingError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("no axiom with id {0}")]
    NotFound(String),
}

type Result<T> = std::result::Result<T, CliError>;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            dir,
            output,
            config,
            base_index,
            pretty,
        } => cmd_extract(&dir, output.as_deref(), config.as_deref(), base_index.as_deref(), pretty),
        Commands::Index { axioms, output } => cmd_index(&axioms, &output),
        Commands::Pairings {
            dir,
            axioms,
            manifest,
            config,
            output,
        } => cmd_pairings(&dir, axioms.as_deref(), manifest.as_deref(), config.as_deref(), output.as_deref()),
        Commands::Annotations { dir, output } => cmd_annotations(&dir, output.as_deref()),
        Commands::Load { db, axioms, pairings } => cmd_load(&db, &axioms, pairings.as_deref()),
        Commands::Query { db, selector } => cmd_query(&db, &selector),
        Commands::Search {
            axioms,
            text,
            limit,
            tag,
            function,
        } => cmd_search(&axioms, &text, limit, tag, function),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ExtractConfig> {
    Ok(match path {
        Some(path) => ExtractConfig::load(path)?,
        None => ExtractConfig::default(),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => fs::write(path, json).map_err(|source| CliError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn cmd_extract(
    dir: &Path,
    output: Option<&Path>,
    config: Option<&Path>,
    base_index: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let extractor = Extractor::new(load_config(config)?);
    let mut extraction = extractor.extract_dir(dir)?;
    let base = base_index.map(FunctionIndex::load).transpose()?;

    let (index, report) = resolve_dependencies(&mut extraction.axioms, &extraction.rhs_by_id, base.as_ref());
    for cycle in find_cycles(&extraction.axioms) {
        tracing::warn!(code = cycle.code(), "{cycle}");
    }
    tracing::info!(
        files = extraction.report.files_seen,
        failed = extraction.report.files_failed,
        rules = extraction.report.rules_parsed,
        axioms = extraction.axioms.len(),
        functions = index.len(),
        edges = report.resolved_edges,
        unresolved = report.unresolved_total(),
        "extraction finished"
    );

    let collection = AxiomCollection::new(dir.display().to_string(), extraction.axioms);
    write_json(&collection, output, pretty)?;
    if let Some(path) = output {
        println!("Wrote {} axioms to {}", collection.len(), path.display());
    }
    Ok(())
}

fn cmd_index(axioms: &Path, output: &Path) -> Result<()> {
    let collection: AxiomCollection = read_json(axioms)?;
    let index = FunctionIndex::from_axioms(collection.axioms.iter());
    index.save(output)?;
    println!("Indexed {} functions to {}", index.len(), output.display());
    Ok(())
}

fn cmd_pairings(
    dir: &Path,
    axioms: Option<&Path>,
    manifest: Option<&Path>,
    config: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    let extraction = Extractor::new(load_config(config)?).extract_dir(dir)?;
    let index = match axioms {
        Some(path) => {
            let collection: AxiomCollection = read_json(path)?;
            FunctionIndex::from_axioms(collection.axioms.iter())
        }
        None => FunctionIndex::from_axioms(extraction.axioms.iter()),
    };

    let mut collection = PairingResolver::default().resolve(&extraction.rules, &index);
    if let Some(path) = manifest {
        let mut declared = PairingManifest::load(path)?.to_collection();
        resolve_placeholders(&mut declared, &index);
        collection.extend(declared);
    }
    tracing::info!(
        pairings = collection.pairings.len(),
        idioms = collection.idioms.len(),
        "pairing detection finished"
    );
    write_json(&collection, output, true)
}

fn cmd_annotations(dir: &Path, output: Option<&Path>) -> Result<()> {
    let collection = AnnotationScanner::new().scan_dir(dir);
    tracing::info!(
        pairings = collection.pairings.len(),
        idioms = collection.idioms.len(),
        "annotation scan finished"
    );
    write_json(&collection, output, true)
}

fn cmd_load(db: &Path, axioms: &Path, pairings: Option<&Path>) -> Result<()> {
    let mut store = RedbStorage::new(db)?;

    let collection: AxiomCollection = read_json(axioms)?;
    let loaded = store.load_axioms(&collection.axioms)?;
    println!("Loaded {loaded} axioms");

    if let Some(path) = pairings {
        let pairings: PairingCollection = read_json(path)?;
        let report = store.load_pairings(&pairings)?;
        println!(
            "Loaded {} pairings ({} skipped), {} idioms",
            report.pairings_loaded, report.pairings_skipped, report.idioms_loaded
        );
    }

    for violation in store.verify()? {
        tracing::warn!("{violation}");
    }
    print!("{}", store.stats()?);
    Ok(())
}

fn cmd_query(db: &Path, selector: &QuerySelector) -> Result<()> {
    let store = RedbStorage::new(db)?;

    if let Some(id) = &selector.id {
        let axiom = store.get_axiom(id)?.ok_or_else(|| CliError::NotFound(id.clone()))?;
        return write_json(&axiom, None, true);
    }

    let records = if let Some(function) = &selector.function {
        store.query_by_function(function)?
    } else if let Some(header) = &selector.header {
        store.query_by_header(header)?
    } else if let Some(module) = &selector.module {
        store.query_by_module(module)?
    } else if let Some(id) = &selector.proof_chain {
        store.proof_chain(id)?
    } else if let Some(layer) = &selector.ungrounded {
        store.ungrounded(layer)?
    } else {
        Vec::new()
    };

    if records.is_empty() {
        println!("No results found");
    }
    for record in &records {
        print_record(record);
    }
    Ok(())
}

fn print_record(record: &AxiomRecord) {
    println!("  {} [{}] {}", record.id, record.axiom_type, record.content);
    if let Some(function) = &record.function {
        println!("    function: {function}");
    }
    if !record.depends_on.is_empty() {
        println!("    depends_on: {}", record.depends_on.join(", "));
    }
}

fn cmd_search(axioms: &Path, text: &str, limit: usize, tag: Option<String>, function: Option<String>) -> Result<()> {
    let collection: AxiomCollection = read_json(axioms)?;
    let mut index = VectorIndex::new(Box::new(HashingEmbedder::default()));
    index.add_all(&collection.axioms);

    let filter = VectorFilter {
        tag,
        function,
        ..VectorFilter::default()
    };
    let hits = index.search(text, limit, &filter);
    if hits.is_empty() {
        println!("No results found");
    }
    for hit in hits {
        println!("  {:.3} {} {}", hit.score, hit.id, hit.metadata.content);
    }
    Ok(())
}
