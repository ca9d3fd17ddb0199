//! strata - text, word, search and table extraction over decoded pages
//!
//! Reads a JSON document of positioned page objects and writes plain text
//! (for `text`) or JSON (every other command).

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use strata_core::classify::{CompanyProfile, classify};
use strata_core::selection::{Selection, extract_selections, region_text_settings};
use strata_core::table::Strategy;
use strata_core::{
    DedupeOptions, Document, Page, PageSource, SearchOptions, TableSettings, TextSettings,
};

/// Settings file layout: both sections are optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    text: Option<TextSettings>,
    table: TableSettings,
}

/// Settings after command defaults and command line overrides.
#[derive(Debug)]
struct Settings {
    text: TextSettings,
    table: TableSettings,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Lines,
    Text,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Lines => Strategy::Lines,
            StrategyArg::Text => Strategy::Text,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render page text
    Text {
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// List words with their boxes
    Words {
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// Search rendered text
    Search {
        pattern: String,
        /// Treat the pattern as a regular expression
        #[arg(short = 'r', long, action = ArgAction::SetTrue)]
        regex: bool,
        #[arg(short = 'I', long = "ignore-case", action = ArgAction::SetTrue)]
        ignore_case: bool,
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// Find tables and their cell text
    Tables {
        #[arg(short, long)]
        page: Option<usize>,
        /// Strategy for both axes, overriding the settings file
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,
        /// Explicit vertical ruling x coordinates (comma-separated)
        #[arg(long, value_delimiter = ',')]
        vertical_lines: Vec<f64>,
        /// Explicit horizontal ruling y coordinates (comma-separated)
        #[arg(long, value_delimiter = ',')]
        horizontal_lines: Vec<f64>,
        /// Dump intermediate edges, intersections and cells
        #[arg(long, action = ArgAction::SetTrue)]
        debug_finder: bool,
    },
    /// Drop duplicate glyphs and write the document back out
    Dedupe {
        #[arg(long, default_value = "1.0")]
        tolerance: f64,
    },
    /// Dump object records with bottom-up y coordinates
    Objects {
        #[arg(short, long)]
        page: Option<usize>,
    },
    /// Extract labelled regions listed in a JSON selections file
    Extract { selections: PathBuf },
    /// Detect company and document type from a JSON profiles file
    Classify { profiles: PathBuf },
}

/// Layout reconstruction and table inference over positioned glyphs.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// JSON document to read, or "-" for stdin
    #[arg(short, long, global = true, default_value = "-")]
    input: String,

    /// Path to file where output is written, or "-" for stdout
    #[arg(short, long, global = true, default_value = "-")]
    outfile: String,

    /// JSON settings file with optional "text" and "table" sections
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[arg(long, global = true)]
    x_tolerance: Option<f64>,

    #[arg(long, global = true)]
    y_tolerance: Option<f64>,

    /// Word gap as a ratio of glyph size instead of an absolute tolerance
    #[arg(long, global = true)]
    x_tolerance_ratio: Option<f64>,

    #[arg(long, global = true, action = ArgAction::SetTrue)]
    keep_blank_chars: bool,

    /// Use debug logging level
    #[arg(short = 'd', long, global = true, action = ArgAction::SetTrue)]
    debug: bool,
}

/// Settings file values with command line overrides applied.
///
/// Without a "text" section, region commands (`extract`, `classify`) read
/// with the tighter region word gap and everything else with the defaults.
fn resolve_settings(args: &Args) -> Result<Settings> {
    let file = match &args.settings {
        Some(path) => read_json::<SettingsFile>(path)?,
        None => SettingsFile::default(),
    };
    let mut settings = Settings {
        text: file.text.unwrap_or_else(|| match args.command {
            Command::Extract { .. } | Command::Classify { .. } => region_text_settings(),
            _ => TextSettings::default(),
        }),
        table: file.table,
    };
    let text = &mut settings.text;
    if let Some(x) = args.x_tolerance {
        text.x_tolerance = x;
    }
    if let Some(y) = args.y_tolerance {
        text.y_tolerance = y;
    }
    if args.x_tolerance_ratio.is_some() {
        text.x_tolerance_ratio = args.x_tolerance_ratio;
    }
    if args.keep_blank_chars {
        text.keep_blank_chars = true;
    }
    settings.table.text_settings = settings.text.clone();
    Ok(settings)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn load_document(input: &str) -> Result<Document> {
    let data = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };
    serde_json::from_str(&data).context("input is not a JSON document")
}

/// The requested page, or every page.
fn select_pages(doc: &Document, page: Option<usize>) -> Result<&[Page]> {
    match page {
        Some(n) => Ok(std::slice::from_ref(doc.page(n)?)),
        None => Ok(doc.pages()),
    }
}

fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run<W: Write>(args: &Args, doc: &Document, out: &mut W) -> Result<()> {
    let settings = resolve_settings(args)?;
    let text_settings = &settings.text;

    match &args.command {
        Command::Text { page } => {
            let texts: Vec<String> = match page {
                Some(_) => select_pages(doc, *page)?
                    .iter()
                    .map(|p| p.extract_text(text_settings))
                    .collect(),
                None => doc.par_extract_text(text_settings),
            };
            for text in texts {
                writeln!(out, "{text}")?;
            }
        }
        Command::Words { page } => {
            let words: Vec<_> = select_pages(doc, *page)?
                .iter()
                .map(|p| json!({"page": p.page_number, "words": p.extract_words(text_settings)}))
                .collect();
            write_json(out, &words)?;
        }
        Command::Search {
            pattern,
            regex,
            ignore_case,
            page,
        } => {
            let options = SearchOptions {
                regex: *regex,
                case_sensitive: !ignore_case,
            };
            let mut results = Vec::new();
            for p in select_pages(doc, *page)? {
                let matches = p
                    .search(pattern, &options, text_settings)
                    .with_context(|| format!("search failed for pattern {pattern:?}"))?;
                results.push(json!({"page": p.page_number, "matches": matches}));
            }
            write_json(out, &results)?;
        }
        Command::Tables {
            page,
            strategy,
            vertical_lines,
            horizontal_lines,
            debug_finder,
        } => {
            let mut table_settings = settings.table.clone();
            if let Some(s) = strategy {
                table_settings.vertical_strategy = (*s).into();
                table_settings.horizontal_strategy = (*s).into();
            }
            if !vertical_lines.is_empty() {
                table_settings.explicit_vertical_lines = vertical_lines.clone();
            }
            if !horizontal_lines.is_empty() {
                table_settings.explicit_horizontal_lines = horizontal_lines.clone();
            }
            let mut results = Vec::new();
            for p in select_pages(doc, *page)? {
                if *debug_finder {
                    let debug = p.table_finder(&table_settings).debug()?;
                    results.push(json!({"page": p.page_number, "debug": debug}));
                } else {
                    let tables = p.find_tables(&table_settings)?;
                    let grids: Vec<_> = tables.iter().map(|t| t.extract()).collect();
                    results.push(json!({"page": p.page_number, "tables": tables, "grids": grids}));
                }
            }
            write_json(out, &results)?;
        }
        Command::Dedupe { tolerance } => {
            let options = DedupeOptions {
                tolerance: *tolerance,
                ..DedupeOptions::default()
            };
            let pages: Vec<Page> = doc.pages.iter().map(|p| p.dedupe_chars(&options)).collect();
            let removed: usize = doc
                .pages
                .iter()
                .zip(&pages)
                .map(|(before, after)| before.objects.len() - after.objects.len())
                .sum();
            info!(removed, "deduplicated glyphs");
            write_json(out, &Document::new(pages))?;
        }
        Command::Objects { page } => {
            let records: Vec<_> = select_pages(doc, *page)?
                .iter()
                .flat_map(Page::object_records)
                .collect();
            write_json(out, &records)?;
        }
        Command::Extract { selections } => {
            let selections: Vec<Selection> = read_json(selections)?;
            let extracted = extract_selections(doc, &selections, text_settings)?;
            write_json(out, &extracted)?;
        }
        Command::Classify { profiles } => {
            let profiles: Vec<CompanyProfile> = read_json(profiles)?;
            let result = classify(doc, &profiles, text_settings);
            if result.is_none() {
                info!("document not classified");
            }
            write_json(out, &result)?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .init();

    let doc = load_document(&args.input)?;
    debug!(pages = doc.page_count(), "loaded document");

    let mut output: Box<dyn Write> = if args.outfile == "-" {
        Box::new(BufWriter::new(io::stdout()))
    } else {
        let file = File::create(&args.outfile)
            .with_context(|| format!("failed to create output file {}", args.outfile))?;
        Box::new(BufWriter::new(file))
    };

    run(&args, &doc, &mut output)?;
    output.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::{BBox, Glyph, PageObject};

    fn doc() -> Document {
        let objects: Vec<PageObject> = "Hello"
            .chars()
            .enumerate()
            .map(|(i, c)| {
                let x = 10.0 + 5.0 * i as f64;
                let bbox = BBox::new(x, 10.0, x + 5.0, 20.0).unwrap();
                Glyph::new(1, bbox, c.to_string(), "F", 10.0).into()
            })
            .collect();
        Document::new(vec![Page::new(1, BBox::new(0.0, 0.0, 100.0, 100.0).unwrap(), objects)])
    }

    fn run_to_string(argv: &[&str]) -> String {
        let args = Args::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        run(&args, &doc(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::try_parse_from(["strata", "text", "--x-tolerance", "1.5", "-d"]).unwrap();
        assert!(args.debug);
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.text.x_tolerance, 1.5);
        assert_eq!(settings.table.text_settings.x_tolerance, 1.5);
    }

    #[test]
    fn search_requires_pattern() {
        assert!(Args::try_parse_from(["strata", "search"]).is_err());
    }

    #[test]
    fn text_command_renders_pages() {
        assert_eq!(run_to_string(&["strata", "text"]), "Hello\n");
    }

    #[test]
    fn search_command_reports_offsets() {
        let out = run_to_string(&["strata", "search", "-I", "LLO"]);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["matches"][0]["start"], 2);
        assert_eq!(value[0]["matches"][0]["end"], 5);
    }

    #[test]
    fn missing_page_is_an_error() {
        let args = Args::try_parse_from(["strata", "words", "--page", "3"]).unwrap();
        assert!(run(&args, &doc(), &mut Vec::new()).is_err());
    }

    #[test]
    fn explicit_lines_flag_builds_a_table() {
        let out = run_to_string(&[
            "strata",
            "tables",
            "--vertical-lines",
            "0,100",
            "--horizontal-lines",
            "0,100",
        ]);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["grids"][0][0][0], "Hello");
    }

    /// "A" and "B" two points apart, inside a 100x100 page.
    fn narrow_gap_doc() -> Document {
        let glyph = |text: &str, x0: f64| -> PageObject {
            let bbox = BBox::new(x0, 10.0, x0 + 5.0, 20.0).unwrap();
            Glyph::new(1, bbox, text, "F", 10.0).into()
        };
        let objects = vec![glyph("A", 10.0), glyph("B", 17.0)];
        Document::new(vec![Page::new(1, BBox::new(0.0, 0.0, 100.0, 100.0).unwrap(), objects)])
    }

    fn temp_json(name: &str, contents: &str) -> PathBuf {
        let file = format!("strata-cli-{}-{name}.json", std::process::id());
        let path = std::env::temp_dir().join(file);
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn run_on(doc: &Document, argv: &[&str]) -> serde_json::Value {
        let args = Args::try_parse_from(argv).unwrap();
        let mut out = Vec::new();
        run(&args, doc, &mut out).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn extract_reads_regions_with_narrow_word_gap() {
        let selections = temp_json(
            "selections",
            r#"[{"label": "field", "page": 1,
                 "coordinates": {"x0": 0, "y0": 0, "x1": 50, "y1": 30}}]"#,
        );
        let path = selections.to_str().unwrap();
        let doc = narrow_gap_doc();

        let value = run_on(&doc, &["strata", "extract", path]);
        assert_eq!(value["field"], "A B");

        let value = run_on(&doc, &["strata", "extract", path, "--x-tolerance", "3"]);
        assert_eq!(value["field"], "AB");
        std::fs::remove_file(selections).ok();
    }

    #[test]
    fn classify_matches_spaced_company_name() {
        let profiles = temp_json(
            "profiles",
            r#"[{"company": "A B",
                 "coordinates": [{"x0": 0, "y0": 0, "x1": 50, "y1": 30}],
                 "insurance_types": {"letter": ["A B"]}}]"#,
        );
        let path = profiles.to_str().unwrap();
        let value = run_on(&narrow_gap_doc(), &["strata", "classify", path]);
        assert_eq!(value["company"], "A B");
        assert_eq!(value["document_type"], "letter");
        std::fs::remove_file(profiles).ok();
    }

    #[test]
    fn page_commands_keep_default_word_gap() {
        let args = Args::try_parse_from(["strata", "text"]).unwrap();
        assert_eq!(resolve_settings(&args).unwrap().text, TextSettings::default());
    }

    #[test]
    fn invalid_table_settings_fail() {
        let settings = temp_json("settings", r#"{"table": {"intersection_x_tolerance": -5.0}}"#);
        let path = settings.to_str().unwrap();
        let args = Args::try_parse_from(["strata", "tables", "--settings", path]).unwrap();
        assert!(run(&args, &doc(), &mut Vec::new()).is_err());
        std::fs::remove_file(settings).ok();
    }
}
