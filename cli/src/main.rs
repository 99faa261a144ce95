//! quire CLI - render JSON manuscripts to every backend

mod manuscript;
mod references;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use manuscript::Manuscript;
use quire::render::location_label;
use quire::{BackendRegistry, Document, JsonFormat, OutputFormat, ReferenceSource, RenderOptions};

#[derive(Parser)]
#[command(name = "quire")]
#[command(version)]
#[command(about = "Render JSON manuscripts to word-processor, fixed-page and e-book artifacts", long_about = None)]
struct Cli {
    /// Input manuscript
    #[arg(value_name = "MANUSCRIPT")]
    input: Option<PathBuf>,

    /// Output directory
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a manuscript with one or all backends
    Render {
        /// Input manuscript
        #[arg(value_name = "MANUSCRIPT")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Backend to render with
        #[arg(short, long, value_enum, default_value = "all")]
        format: FormatArg,

        /// Directory of JSON reference records
        #[arg(long, value_name = "DIR", env = "QUIRE_REFERENCES")]
        references: Option<PathBuf>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Reject comment spans in fixed-page output
        #[arg(long)]
        no_annotations: bool,

        /// Stylesheet file for e-book output
        #[arg(long, value_name = "FILE")]
        stylesheet: Option<PathBuf>,
    },

    /// Show manuscript outline and registry summaries
    Info {
        /// Input manuscript
        #[arg(value_name = "MANUSCRIPT")]
        input: PathBuf,

        /// Directory of JSON reference records
        #[arg(long, value_name = "DIR", env = "QUIRE_REFERENCES")]
        references: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Word-processor document
    Docx,
    /// Fixed-page document
    Pdf,
    /// Reflowable e-book
    Epub,
    /// Every backend, rendered in parallel
    All,
}

impl FormatArg {
    fn formats(self) -> Vec<OutputFormat> {
        match self {
            FormatArg::Docx => vec![OutputFormat::Docx],
            FormatArg::Pdf => vec![OutputFormat::Pdf],
            FormatArg::Epub => vec![OutputFormat::Epub],
            FormatArg::All => OutputFormat::ALL.to_vec(),
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Render {
            input,
            output,
            format,
            references,
            compact,
            no_annotations,
            stylesheet,
        }) => render_options(no_annotations, stylesheet.as_deref()).and_then(|options| {
            cmd_render(
                &input,
                output.as_deref(),
                format,
                references.as_deref(),
                compact,
                &options,
            )
        }),
        Some(Commands::Info { input, references }) => cmd_info(&input, references.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: render every backend if input is provided
            if let Some(input) = cli.input {
                cmd_render(
                    &input,
                    cli.output.as_deref(),
                    FormatArg::All,
                    None,
                    false,
                    &RenderOptions::default(),
                )
            } else {
                println!("{}", "Usage: quire <MANUSCRIPT> [OUTPUT]".yellow());
                println!("       quire --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn render_options(
    no_annotations: bool,
    stylesheet: Option<&Path>,
) -> Result<RenderOptions, Box<dyn std::error::Error>> {
    let mut options = RenderOptions::new().with_page_annotations(!no_annotations);
    if let Some(path) = stylesheet {
        options = options.with_ebook_stylesheet(fs::read_to_string(path)?);
    }
    Ok(options)
}

fn load_document(
    input: &Path,
    reference_dir: Option<&Path>,
) -> Result<Document, Box<dyn std::error::Error>> {
    let manuscript = Manuscript::load(input)?;
    let source = match reference_dir {
        Some(dir) => {
            let map = references::load_dir(dir)?;
            log::info!("loaded {} references from {}", map.len(), dir.display());
            Some(Arc::new(map) as Arc<dyn ReferenceSource>)
        }
        None => None,
    };
    Ok(manuscript.build(source)?)
}

fn cmd_render(
    input: &Path,
    output: Option<&Path>,
    format: FormatArg,
    references: Option<&Path>,
    compact: bool,
    options: &RenderOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let output_dir = output
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(format!("{}_output", stem)));

    fs::create_dir_all(&output_dir)?;

    let formats = format.formats();
    let pb = ProgressBar::new(formats.len() as u64 + 1);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Building document...");
    let doc = load_document(input, references)?;
    pb.inc(1);

    pb.set_message("Rendering...");
    let registry = BackendRegistry::with_defaults();
    let names: Vec<&str> = formats.iter().map(OutputFormat::as_str).collect();
    let results = registry.render_selected(&names, &doc, options);

    let json_format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let mut written = Vec::new();
    let mut failures = Vec::new();
    for (name, result) in results {
        match result {
            Ok(artifact) => {
                let json = quire::render::to_json(&artifact, json_format)?;
                let file_name = format!("{}.{}.json", stem, name);
                fs::write(output_dir.join(&file_name), &json)?;
                written.push((file_name, artifact.stats().page_count));
            }
            Err(e) => failures.push((name, e)),
        }
        pb.inc(1);
    }

    pb.finish_with_message("Done!");

    if !written.is_empty() {
        println!("\n{}", "Output files:".green().bold());
        let last = written.len() - 1;
        for (i, (file_name, pages)) in written.iter().enumerate() {
            let branch = if i == last { "└─" } else { "├─" };
            println!("  {} {} ({} pages)", branch.dimmed(), file_name, pages);
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        for (name, e) in &failures {
            eprintln!("{} {}: {}", "Failed".red(), name, e);
        }
        Err(format!("{} backend(s) failed", failures.len()).into())
    }
}

fn cmd_info(input: &Path, references: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let doc = load_document(input, references)?;
    let metadata = doc.metadata();
    let config = doc.config();

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref subtitle) = metadata.subtitle {
        println!("{}: {}", "Subtitle".bold(), subtitle);
    }
    if let Some(authors) = metadata.author_line() {
        println!("{}: {}", "Authors".bold(), authors);
    }
    if let Some(ref version) = metadata.version {
        println!("{}: {}", "Version".bold(), version);
    }
    println!("{}: {}", "Language".bold(), metadata.language);

    println!();
    println!("{}", "Outline".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    doc.visit_sections(|path, section| {
        let indent = "  ".repeat(section.depth.saturating_sub(1));
        let mut directives: Vec<String> = section
            .page_directives
            .iter()
            .map(|(key, page)| format!("{}@{}", key, page))
            .collect();
        directives.sort();
        if directives.is_empty() {
            println!("{}{} {}", indent, path.to_string().dimmed(), section.title);
        } else {
            println!(
                "{}{} {} {}",
                indent,
                path.to_string().dimmed(),
                section.title,
                format!("[{}]", directives.join(", ")).yellow()
            );
        }
    });

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let text = doc.plain_text();
    let words: usize = text.split_whitespace().count();

    println!("{}: {}", "Sections".bold(), doc.section_count());
    println!("{}: {}", "Words".bold(), words);
    println!("{}: {}", "TOC entries".bold(), doc.toc().len());
    println!("{}: {}", "Footnotes".bold(), doc.footnotes().len());
    println!("{}: {}", "Citations".bold(), doc.references().len());
    let missing = doc.references().missing();
    if !missing.is_empty() {
        println!(
            "{}: {}",
            "Unresolved".bold(),
            missing.join(", ").yellow()
        );
    }

    if !doc.index().is_empty() {
        println!();
        println!("{}", "Index".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for entry in doc.index().emit_index() {
            let locations: Vec<String> = entry
                .locations
                .iter()
                .map(|loc| location_label(loc, config))
                .collect();
            println!("{} {}", entry.key.bold(), locations.join(", "));
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "quire".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Multi-backend document composition tool");
    println!();
    println!("Backends: docx, pdf, epub");
    println!("License: MIT");
}
