//! xosc CLI: OpenSCENARIO <-> JSON conversion and checks.

use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::io::{IsTerminal, Read, Write};
use std::process;
use xosc::{
    decode_with_options, encode_with_options, DecodeOptions, Decoded, Diagnostic, EncodeOptions,
    ParameterTable, ReferenceResolver, ScenarioDocument,
};

#[derive(Parser)]
#[command(name = "xosc", about = "OpenSCENARIO 1.0 import/export")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode an OpenSCENARIO file to the JSON document model
    Import(ImportArgs),
    /// Encode a JSON document model to OpenSCENARIO
    Export(ExportArgs),
    /// Decode and validate references, print diagnostics
    Check(CheckArgs),
    /// Decode and re-encode an OpenSCENARIO file
    Roundtrip(RoundtripArgs),
}

#[derive(Args)]
struct ImportArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    decode: DecodeArgs,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    encode: EncodeArgs,
}

#[derive(Args)]
struct CheckArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    #[command(flatten)]
    decode: DecodeArgs,

    /// Treat diagnostics as errors
    #[arg(long)]
    deny_diagnostics: bool,
}

#[derive(Args)]
struct RoundtripArgs {
    #[command(flatten)]
    io: IoArgs,

    #[command(flatten)]
    decode: DecodeArgs,

    #[command(flatten)]
    encode: EncodeArgs,
}

#[derive(Args)]
struct IoArgs {
    /// Input file (- for stdin)
    #[arg(short, long)]
    input: String,

    /// Output file (optional; without -o auto-derived, -o - = stdout)
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Args)]
struct DecodeArgs {
    /// Accept non-canonical constant content without diagnostics
    #[arg(long)]
    lenient: bool,

    /// Suppress diagnostics on stderr
    #[arg(short, long)]
    quiet: bool,
}

impl DecodeArgs {
    fn to_options(&self) -> DecodeOptions {
        let opts = DecodeOptions::default();
        if self.lenient {
            opts.with_lenient_templates()
        } else {
            opts
        }
    }
}

#[derive(Args)]
struct EncodeArgs {
    /// Spaces per nesting level (0 = single line)
    #[arg(long, default_value_t = 4)]
    indent: usize,

    /// Write declared parameter values instead of $name references
    #[arg(long)]
    inline_parameters: bool,

    /// FileHeader date (YYYY-MM-DDTHH:MM:SS, default: now)
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDateTime>,
}

impl EncodeArgs {
    fn to_options(&self) -> EncodeOptions {
        let mut opts = EncodeOptions::default().with_indent(self.indent);
        opts.set_timestamp(self.date);
        if self.inline_parameters {
            opts = opts.with_inline_parameters();
        }
        opts
    }
}

fn parse_date(s: &str) -> Result<NaiveDateTime, String> {
    s.parse::<NaiveDateTime>()
        .map_err(|e| format!("ungueltiges Datum '{s}': {e}"))
}

/// JSON-Austauschformat: Dokument plus globale Parameter.
///
/// `import` schreibt zusaetzlich `metadata` und `diagnostics`; beim Einlesen werden
/// diese Felder ignoriert.
#[derive(Serialize, Deserialize)]
struct Scenario {
    document: ScenarioDocument,
    #[serde(default)]
    parameters: ParameterTable,
}

fn read_input(path: &str) -> Result<Vec<u8>, String> {
    if path == "-" {
        if std::io::stdin().is_terminal() {
            eprintln!("Lese von stdin (Ctrl+D zum Beenden)...");
        }
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| format!("Lesefehler (stdin): {e}"))?;
        Ok(buf)
    } else {
        std::fs::read(path).map_err(|e| format!("Lesefehler '{}': {e}", path))
    }
}

fn read_text(path: &str) -> Result<String, String> {
    String::from_utf8(read_input(path)?).map_err(|e| format!("Eingabe muss UTF-8 sein: {e}"))
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Fehler: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Import(args) => run_import(args),
        Command::Export(args) => run_export(args),
        Command::Check(args) => run_check(args),
        Command::Roundtrip(args) => run_roundtrip(args),
    }
}

fn decode_input(path: &str, args: &DecodeArgs) -> Result<Decoded, String> {
    let xml = read_text(path)?;
    let decoded = decode_with_options(&xml, &args.to_options())
        .map_err(|e| format!("Import-Fehler: {e}"))?;
    if !args.quiet {
        report_diagnostics(&decoded.diagnostics);
    }
    Ok(decoded)
}

fn report_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        eprintln!("{d}");
    }
}

fn run_import(args: ImportArgs) -> Result<(), String> {
    let decoded = decode_input(&args.io.input, &args.decode)?;
    let json = if args.pretty {
        serde_json::to_string_pretty(&decoded)
    } else {
        serde_json::to_string(&decoded)
    }
    .map_err(|e| format!("JSON encode error: {e}"))?;

    let output = resolve_output_path(args.io.output.as_deref(), &args.io.input, "json")?;
    write_to_output(&output, |mut writer| {
        writer.write_all(json.as_bytes())
            .map_err(|e| format!("Schreibfehler: {e}"))?;
        writer.write_all(b"\n")
            .map_err(|e| format!("Schreibfehler: {e}"))?;
        writer.flush().map_err(|e| format!("Schreibfehler: {e}"))
    })
}

fn run_export(args: ExportArgs) -> Result<(), String> {
    let json = read_text(&args.io.input)?;
    let scenario: Scenario = serde_json::from_str(&json)
        .map_err(|e| format!("JSON parse error: {e}"))?;
    let xml = encode_with_options(&scenario.document, &scenario.parameters, &args.encode.to_options())
        .map_err(|e| format!("Export-Fehler: {e}"))?;

    let output = resolve_output_path(args.io.output.as_deref(), &args.io.input, "xosc")?;
    write_xml(&output, &xml)
}

fn run_check(args: CheckArgs) -> Result<(), String> {
    let decoded = decode_input(&args.input, &args.decode)?;
    ReferenceResolver::new(&decoded.document)
        .validate_document(&decoded.parameters)
        .map_err(|e| format!("Referenzfehler: {e}"))?;

    eprintln!(
        "{}: {} entities, {} maneuvers, {} parameters, {} diagnostics",
        args.input,
        decoded.document.entities.len(),
        decoded.document.maneuvers.len(),
        decoded.parameters.len(),
        decoded.diagnostics.len(),
    );
    if args.deny_diagnostics && !decoded.diagnostics.is_empty() {
        return Err(format!("{} Diagnosen", decoded.diagnostics.len()));
    }
    Ok(())
}

fn run_roundtrip(args: RoundtripArgs) -> Result<(), String> {
    let decoded = decode_input(&args.io.input, &args.decode)?;
    let xml = encode_with_options(&decoded.document, &decoded.parameters, &args.encode.to_options())
        .map_err(|e| format!("Export-Fehler: {e}"))?;

    let output = match args.io.output {
        Some(path) => path,
        None => "-".to_string(),
    };
    write_xml(&output, &xml)
}

fn write_xml(output: &str, xml: &str) -> Result<(), String> {
    write_to_output(output, |mut writer| {
        writer.write_all(xml.as_bytes())
            .map_err(|e| format!("Schreibfehler: {e}"))?;
        writer.flush().map_err(|e| format!("Schreibfehler: {e}"))
    })
}

fn create_buf_writer(path: &str) -> Result<std::io::BufWriter<Box<dyn Write>>, String> {
    if path == "-" {
        Ok(std::io::BufWriter::new(Box::new(std::io::stdout())))
    } else {
        let file = std::fs::File::create(path)
            .map_err(|e| format!("Schreibfehler: {e}"))?;
        Ok(std::io::BufWriter::new(Box::new(file)))
    }
}

/// Schreibt Output entweder nach stdout ("-") oder atomar in eine Datei (tmp+rename).
fn write_to_output(
    output_path: &str,
    write_fn: impl FnOnce(std::io::BufWriter<Box<dyn Write>>) -> Result<(), String>,
) -> Result<(), String> {
    if output_path == "-" {
        return write_fn(create_buf_writer("-")?);
    }

    let tmp_path = format!("{output_path}.tmp");
    let writer = create_buf_writer(&tmp_path)?;
    if let Err(e) = write_fn(writer) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }
    std::fs::rename(&tmp_path, output_path)
        .map_err(|e| format!("Rename-Fehler: {e}"))
}

/// Leitet den Output-Pfad aus der Eingabe und der gewuenschten Extension ab.
///
/// Bei explizitem `-o` wird dieser Pfad direkt verwendet. Ohne `-o` wird
/// die Extension der Eingabedatei ersetzt (bzw. angehaengt wenn keine vorhanden).
fn resolve_output_path(explicit: Option<&str>, input: &str, ext: &str) -> Result<String, String> {
    if let Some(path) = explicit {
        return Ok(path.to_string());
    }
    if input == "-" {
        return Err("ohne -o braucht es eine Eingabedatei (nicht stdin)".into());
    }
    let path = std::path::Path::new(input);
    let stem = path.file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| "ungueltiger Eingabepfad".to_string())?;
    let parent = path.parent().unwrap_or_else(|| std::path::Path::new(""));
    Ok(parent.join(format!("{stem}.{ext}")).to_string_lossy().to_string())
}
