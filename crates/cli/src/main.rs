mod render;

use std::fs;
use std::io::{self, Read, Write};

use std::process;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use pchtxt_core::dump::to_pretty_json;
use pchtxt_core::ips::write_ips;
use pchtxt_core::meta::scan_meta_with_sink;
use pchtxt_core::model::PatchCollection;
use pchtxt_core::parser::{ParseResult, parse_str};
use pchtxt_diagnostics::{Diagnostic, Severity, codes};

use crate::render::{Format, print_summary, render_diagnostics};

// ── CLI definition ──────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pchtxt",
    version,
    about = "pchtxt toolchain — parse, check, and compile Patch Text files"
)]
struct Cli {
    /// Output mode: "pretty" for coloured terminal output, "json" for
    /// machine-readable JSON. Defaults to "pretty" when stdout is a TTY,
    /// "json" otherwise.
    #[arg(long, global = true, value_parser = ["pretty", "json"])]
    output: Option<String>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    // ── File analysis commands (progressive: meta → parse → check) ──
    /// Print the metadata block of a patch text file.
    Meta { file: String },

    /// Parse a patch text file and print its compiled output.
    Parse { file: String },

    /// Check a patch text file (exit 1 if it has errors).
    Check { file: String },

    // ── Compilation ─────────────────────────────────────────────────
    /// Compile a patch text file into an IPS32 container.
    Compile {
        file: String,
        /// Output path. Defaults to `<buildId>.ips`.
        #[arg(long, short)]
        out: Option<String>,
        /// Build id of the collection to compile. Defaults to the first
        /// collection in the file.
        #[arg(long)]
        build_id: Option<String>,
    },

    // ── Reference / informational ───────────────────────────────────
    /// Explain a diagnostic ID (e.g. PCH1001).
    Explain { id: String },
}

// ── Main ────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let format = Format::resolve_or_detect(cli.output.as_deref());

    match cli.cmd {
        Cmd::Meta { file } => cmd_meta(&file, format)?,
        Cmd::Parse { file } => cmd_parse(&file, format)?,
        Cmd::Check { file } => cmd_check(&file, format)?,
        Cmd::Compile {
            file,
            out,
            build_id,
        } => cmd_compile(&file, out.as_deref(), build_id.as_deref(), format)?,
        Cmd::Explain { id } => cmd_explain(&id, format)?,
    }

    Ok(())
}

// ── Commands ────────────────────────────────────────────────────────────

fn cmd_meta(file: &str, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let meta = scan_meta_with_sink(&input, &mut diagnostics);

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "meta": meta,
                "diagnostics": diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
    }
    Ok(())
}

fn cmd_parse(file: &str, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let res = parse_str(&input);

    match format {
        Format::Json => {
            // Single valid JSON object to stdout.
            let out = serde_json::json!({
                "output": res.output,
                "diagnostics": res.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            // Compiled output to stdout, diagnostics to stderr.
            println!("{}", to_pretty_json(&res.output));
            if !res.diagnostics.is_empty() {
                render_diagnostics(&input, file, &res.diagnostics, format);
                print_summary(&res.diagnostics);
            }
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

fn cmd_check(file: &str, format: Format) -> Result<()> {
    let input = read_input(file)?;
    let res = parse_str(&input);
    let ok = !res
        .diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error));

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "ok": ok,
                "diagnostics": res.diagnostics,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            render_diagnostics(&input, file, &res.diagnostics, format);
            print_summary(&res.diagnostics);
            if ok {
                eprintln!("check ok");
            }
        }
    }

    exit_on_errors(&res.diagnostics);
    Ok(())
}

fn cmd_compile(
    file: &str,
    out_path: Option<&str>,
    build_id: Option<&str>,
    format: Format,
) -> Result<()> {
    let input = read_input(file)?;
    let res = parse_str(&input);

    // Surface parse diagnostics before writing anything.
    if matches!(format, Format::Pretty) && !res.diagnostics.is_empty() {
        render_diagnostics(&input, file, &res.diagnostics, format);
        print_summary(&res.diagnostics);
    }
    exit_on_errors(&res.diagnostics);

    let collection = select_collection(&res, build_id)
        .with_context(|| format!("nothing to compile from {file}"))?;

    let path = match out_path {
        Some(p) => p.to_string(),
        None => format!("{}.ips", collection.build_id),
    };
    let out_file = fs::File::create(&path).with_context(|| format!("could not create {path}"))?;
    let mut writer = io::BufWriter::new(out_file);
    write_ips(collection, &mut writer).with_context(|| format!("could not write {path}"))?;
    writer.flush()?;

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "status": "compiled",
                "file": file,
                "out": path,
                "build_id": collection.build_id,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            eprintln!("compiled {} ({}) -> {}", file, collection.build_id, path);
        }
    }
    Ok(())
}

fn cmd_explain(id: &str, format: Format) -> Result<()> {
    let Some(explanation) = codes::explain(id) else {
        eprintln!("unknown diagnostic id: {id}");
        process::exit(1);
    };

    match format {
        Format::Json => {
            let out = serde_json::json!({
                "id": id,
                "explanation": explanation,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Format::Pretty => {
            println!("{id}: {explanation}");
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────

/// Read the input file, or stdin when the path is `-`.
fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("could not read stdin")?;
        Ok(buf)
    } else {
        fs::read_to_string(file).with_context(|| format!("could not open file {file}"))
    }
}

/// Pick the collection to compile: by build id when given, else the first.
fn select_collection<'a>(
    res: &'a ParseResult,
    build_id: Option<&str>,
) -> Result<&'a PatchCollection> {
    match build_id {
        Some(id) => res
            .output
            .collections
            .iter()
            .find(|c| c.build_id == id)
            .ok_or_else(|| anyhow::anyhow!("no collection with build id {id}")),
        None => {
            if res.output.collections.is_empty() {
                bail!("no patch collections found");
            }
            Ok(&res.output.collections[0])
        }
    }
}

/// Exit with status 1 when any error-severity diagnostic was produced.
fn exit_on_errors(diagnostics: &[Diagnostic]) {
    if diagnostics
        .iter()
        .any(|d| matches!(d.severity, Severity::Error))
    {
        process::exit(1);
    }
}
