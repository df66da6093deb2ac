//! Factoid CLI
//!
//! - `to-biopax`: template document (JSON) -> BioPAX Level 3 RDF/XML
//! - `to-json`: BioPAX RDF/XML -> simplified templates grouped by PubMed id
//! - `inspect`: build a document's graph and report what was built

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use factoid_biopax::{graph_from_rdf_xml, templates_by_publication};
use factoid_graph::{GraphStats, XrefKeyMode};
use factoid_templates::{BuildReport, ConvertConfig, Converter, Protocol};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "factoid")]
#[command(author, version, about = "Factoid: template documents to BioPAX and back")]
struct Cli {
    /// More log output on stderr (repeatable).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a template document into BioPAX RDF/XML.
    ToBiopax {
        /// Input JSON document (`-` for stdin)
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        build: BuildArgs,
    },

    /// Read BioPAX RDF/XML and print its templates grouped by publication.
    ToJson {
        /// Input RDF/XML (`-` for stdin)
        input: PathBuf,
        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Build a document's graph and print node counts and skipped templates.
    Inspect {
        /// Input JSON document (`-` for stdin)
        input: PathBuf,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        build: BuildArgs,
    },
}

#[derive(Args, Debug, Clone)]
struct BuildArgs {
    /// Build configuration (JSON); flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Fail on unknown templates, unmatched participants and invalid entities.
    #[arg(long)]
    strict: bool,
    /// Xref dedup key.
    #[arg(long, value_enum)]
    xref_key: Option<XrefKeyArg>,
    /// IRI prefix of exported nodes.
    #[arg(long)]
    base_iri: Option<String>,
    /// Read the document as a legacy template list.
    #[arg(long)]
    legacy: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum XrefKeyArg {
    Id,
    IdAndDb,
}

impl From<XrefKeyArg> for XrefKeyMode {
    fn from(value: XrefKeyArg) -> Self {
        match value {
            XrefKeyArg::Id => XrefKeyMode::IdOnly,
            XrefKeyArg::IdAndDb => XrefKeyMode::IdAndDb,
        }
    }
}

impl BuildArgs {
    fn config(&self) -> Result<ConvertConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                ConvertConfig::from_json_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => ConvertConfig::default(),
        };
        if self.strict {
            config = config.strict(true);
        }
        if let Some(mode) = self.xref_key {
            config = config.with_xref_key(mode.into());
        }
        if let Some(base_iri) = &self.base_iri {
            config.base_iri = base_iri.clone();
        }
        if self.legacy {
            config = config.with_protocol(Protocol::Legacy);
        }
        Ok(config)
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::ToBiopax { input, out, build } => cmd_to_biopax(&input, out.as_deref(), &build),
        Commands::ToJson { input, out } => cmd_to_json(&input, out.as_deref()),
        Commands::Inspect { input, json, build } => cmd_inspect(&input, json, &build),
    }
}

// ============================================================================
// I/O helpers
// ============================================================================

fn read_input(input: &Path) -> Result<String> {
    if input == Path::new("-") {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(text);
    }
    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            if !text.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn build(input: &Path, args: &BuildArgs) -> Result<Converter> {
    let config = args.config()?;
    let text = read_input(input)?;
    let mut converter = Converter::new(config);
    converter
        .add_json_str(&text)
        .with_context(|| format!("failed to convert {}", input.display()))?;

    let report = converter.report();
    tracing::info!(
        applied = report.applied,
        skipped = report.skipped(),
        nodes = converter.graph().node_count(),
        "build finished"
    );
    Ok(converter)
}

// ============================================================================
// Commands
// ============================================================================

fn cmd_to_biopax(input: &Path, out: Option<&Path>, args: &BuildArgs) -> Result<()> {
    let converter = build(input, args)?;
    let xml = converter.to_biopax_xml().context("failed to write BioPAX")?;
    write_output(out, &xml)
}

fn cmd_to_json(input: &Path, out: Option<&Path>) -> Result<()> {
    let text = read_input(input)?;
    let graph = graph_from_rdf_xml(text.as_bytes())
        .with_context(|| format!("failed to read BioPAX from {}", input.display()))?;
    let report = templates_by_publication(&graph);
    tracing::info!(publications = report.len(), "report finished");
    write_output(out, &serde_json::to_string_pretty(&report)?)
}

#[derive(Serialize)]
struct InspectOutput<'a> {
    stats: GraphStats,
    report: &'a BuildReport,
}

fn cmd_inspect(input: &Path, json: bool, args: &BuildArgs) -> Result<()> {
    let converter = build(input, args)?;
    let stats = converter.graph().stats();
    let report = converter.report();

    if json {
        let output = InspectOutput { stats, report };
        return write_output(None, &serde_json::to_string_pretty(&output)?);
    }

    println!("{}", "Graph".bold());
    println!("  xrefs:        {}", stats.xrefs);
    println!("  references:   {}", stats.references);
    println!("  features:     {}", stats.features);
    println!("  entities:     {}", stats.entities);
    println!("  interactions: {}", stats.interactions);
    for (class, count) in &stats.by_class {
        println!("    {class:<28} {count}");
    }

    println!("{}", "Templates".bold());
    println!("  {} {}", "applied".green(), report.applied);
    let skipped = [
        ("unknown", &report.unknown),
        ("invalid", &report.invalid),
        ("dropped", &report.dropped),
    ];
    for (label, templates) in skipped {
        if templates.is_empty() {
            continue;
        }
        println!("  {} {}", label.yellow(), templates.len());
        for t in templates {
            println!("    #{} {}: {}", t.index, t.template_type, t.reason);
        }
    }
    Ok(())
}
