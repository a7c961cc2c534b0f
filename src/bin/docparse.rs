//! CLI binary for edgequake-docparse.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docparse::{
    default_fields, write_json, DocParseError, DocumentParser, ErrorCategory, ExtractionConfig,
    ExtractionMode, ExtractionProgressCallback, ExtractionRequest, FieldSchema, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::{Map, Value};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that follows the extraction through its stages.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_extraction_start(&self, filename: &str, size_bytes: usize, page_count: usize) {
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(filename),
            dim(&format!("{page_count} pages, {size_bytes} bytes"))
        ));
        self.bar.set_prefix("Converting");
        self.bar.set_message("extracting text…");
    }

    fn on_fallback(&self, text_error: &str) {
        self.bar.println(format!(
            "  {} text extraction failed: {}",
            cyan("⚠"),
            dim(text_error)
        ));
        self.bar.set_message("rendering page images…");
    }

    fn on_mode_selected(&self, mode: ExtractionMode) {
        self.bar.println(format!("  {} {} mode", green("✓"), mode));
    }

    fn on_request_sent(&self, model: &str) {
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!("waiting for {model}…"));
    }

    fn on_extraction_complete(&self, mode: ExtractionMode, duration_ms: u64) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} Extracted in {} mode  {}",
            green("✔"),
            mode,
            dim(&format!("{:.1}s", duration_ms as f64 / 1000.0))
        );
    }

    // main reports the error itself; only the spinner is cleared here.
    fn on_extraction_error(&self, _error: &str) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Default fields (document_type, date, company_name, ...)
  docparse invoice.pdf

  # Custom field schema
  docparse invoice.pdf --fields fields.json

  # Full request object with instructions
  docparse receipt.pdf --request request.json

  # Extra guidance for the model
  docparse contract.pdf -i "Dates are written DD/MM/YYYY"

  # Four-key JSON record, or the record plus run statistics
  docparse invoice.pdf --json
  docparse invoice.pdf --with-stats -o result.json

  # Show the default schema and the active settings
  docparse --default-fields
  docparse --show-config

FIELD SCHEMA FILE (--fields):
  [
    {"name": "invoice_number", "description": "Invoice identifier", "data_type": "string"},
    {"name": "total", "description": "Invoice total", "data_type": "number", "required": true}
  ]

REQUEST FILE (--request):
  {"custom_fields": [...], "extraction_instructions": "..."}

EXIT CODES:
  0  success
  1  other failure (configuration, output, internal)
  2  invalid input (file type, size, not a PDF, bad schema)
  3  conversion failure (neither text nor images could be extracted)
  4  model call failed
  5  model reply was not the expected JSON

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  OPENAI_MODEL            Text-mode model (default gpt-4o-mini)
  DOCPARSE_VISION_MODEL   Vision-mode model (default gpt-4o)
  DOCPARSE_PROVIDER       LLM provider (default openai)
  MAX_FILE_SIZE_MB        Upload size ceiling (default 10)
  ALLOWED_EXTENSIONS      Comma-separated extension allow-list (default pdf)
  PDFIUM_LIB_PATH         Path to libpdfium; otherwise the system library is used
"#;

/// Extract structured fields from PDF documents using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "docparse",
    version,
    about = "Extract structured fields from PDF documents using LLMs",
    long_about = "Extract a caller-defined set of fields from PDF documents (local files or URLs). \
Text PDFs are sent to the model as text; scanned PDFs fall back to page images sent to a \
vision-capable model. The reply is normalised so every requested field is always present.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    #[arg(required_unless_present_any = ["default_fields", "show_config"])]
    input: Option<String>,

    /// JSON file with an array of field definitions.
    #[arg(long, conflicts_with = "request")]
    fields: Option<PathBuf>,

    /// JSON file with a full request object ({custom_fields, extraction_instructions}).
    #[arg(long)]
    request: Option<PathBuf>,

    /// Additional extraction instructions for the model.
    #[arg(short, long)]
    instructions: Option<String>,

    /// Write JSON output to this file instead of stdout.
    #[arg(short, long, env = "DOCPARSE_OUTPUT")]
    output: Option<PathBuf>,

    /// Print the four-key JSON record instead of the human-readable summary.
    #[arg(long, env = "DOCPARSE_JSON")]
    json: bool,

    /// Output the record together with extraction statistics (implies --json).
    #[arg(long)]
    with_stats: bool,

    /// Print the default field schema and exit.
    #[arg(long)]
    default_fields: bool,

    /// Print the active configuration and exit.
    #[arg(long)]
    show_config: bool,

    /// Text-mode model ID.
    #[arg(long, env = "OPENAI_MODEL", default_value = edgequake_docparse::config::DEFAULT_MODEL)]
    model: String,

    /// Vision-mode model ID, used when the PDF has no extractable text.
    #[arg(long, env = "DOCPARSE_VISION_MODEL", default_value = edgequake_docparse::config::DEFAULT_VISION_MODEL)]
    vision_model: String,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "DOCPARSE_PROVIDER", default_value = edgequake_docparse::config::DEFAULT_PROVIDER)]
    provider: String,

    /// Upload size ceiling in MiB.
    #[arg(long, env = "MAX_FILE_SIZE_MB", default_value_t = 10)]
    max_file_size_mb: u64,

    /// Comma-separated file extension allow-list.
    #[arg(long, env = "ALLOWED_EXTENSIONS", default_value = "pdf")]
    allowed_extensions: String,

    /// Rendering DPI for the image fallback (72–400).
    #[arg(long, env = "DOCPARSE_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Maximum rendered page dimension in pixels.
    #[arg(long, env = "DOCPARSE_MAX_PIXELS", default_value_t = 2000)]
    max_pixels: u32,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCPARSE_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Max tokens the model may generate.
    #[arg(long, env = "DOCPARSE_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "DOCPARSE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCPARSE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// Disable the progress spinner.
    #[arg(long, env = "DOCPARSE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "DOCPARSE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCPARSE_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; INFO logs would
    // interleave with it.
    let json_out = cli.json || cli.with_stats;
    let show_progress = !cli.quiet && !cli.no_progress && !json_out && cli.input.is_some();
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", red("Error:"), err);
            ExitCode::from(exit_code(&err))
        }
    }
}

async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    // ── Informational modes ──────────────────────────────────────────────
    if cli.default_fields {
        let body = serde_json::json!({ "default_fields": default_fields() });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    if cli.show_config {
        let body = serde_json::json!({
            "provider": config.provider_name,
            "model": config.model,
            "vision_model": config.vision_model,
            "max_file_size_mb": config.max_file_size_mb,
            "allowed_extensions": config.allowed_extensions,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let input = cli.input.as_deref().context("No input document given")?;
    let request = build_request(&cli).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let parser = DocumentParser::from_config(config)?;
    let output = parser.parse_input(input, &request).await?;

    let body = if cli.with_stats {
        serde_json::to_value(&output)?
    } else {
        serde_json::to_value(&output.document)?
    };

    if let Some(ref path) = cli.output {
        write_json(path, &body).await?;
        if !cli.quiet {
            eprintln!("{} wrote {}", green("✔"), bold(&path.display().to_string()));
        }
    } else if json_mode(&cli) {
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        print_summary(&output.document.configurable_fields, &output.document.discovered_fields);
        if let Some(score) = output.document.confidence_score {
            println!("\nConfidence Score: {score}");
        }
        if let Some(ref notes) = output.document.processing_notes {
            println!("\nProcessing Notes: {notes}");
        }
    }

    let missing = output.document.missing_required(&request.fields);
    if !missing.is_empty() && !cli.quiet {
        eprintln!(
            "{} required field(s) not found: {}",
            cyan("⚠"),
            missing.join(", ")
        );
    }

    Ok(())
}

fn json_mode(cli: &Cli) -> bool {
    cli.json || cli.with_stats
}

fn print_summary(configurable: &Map<String, Value>, discovered: &Map<String, Value>) {
    println!("{}", bold("Document parsed successfully!"));
    println!("{}", "=".repeat(50));

    println!("\nConfigurable Fields:");
    for (name, value) in configurable {
        println!("  {}: {}", name, display_value(value));
    }

    println!("\nDiscovered Fields:");
    if discovered.is_empty() {
        println!("  {}", dim("(none)"));
    }
    for (name, value) in discovered {
        println!("  {}: {}", name, display_value(value));
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::Null => dim("null"),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .provider_name(&cli.provider)
        .model(&cli.model)
        .vision_model(&cli.vision_model)
        .max_file_size_mb(cli.max_file_size_mb)
        .allowed_extensions_csv(&cli.allowed_extensions)
        .dpi(cli.dpi)
        .max_rendered_pixels(cli.max_pixels)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd);
    }
    if let Some(ref path) = cli.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    Ok(builder.build()?)
}

/// Assemble the per-document request from `--request`, `--fields` and `-i`.
async fn build_request(cli: &Cli) -> Result<ExtractionRequest> {
    let mut request = if let Some(ref path) = cli.request {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read request from {:?}", path))?;
        ExtractionRequest::from_json(&json)?
    } else if let Some(ref path) = cli.fields {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read fields from {:?}", path))?;
        ExtractionRequest::new(FieldSchema::from_json(&json)?)
    } else {
        ExtractionRequest::default()
    };

    if let Some(ref text) = cli.instructions {
        request = request.with_instructions(text.as_str());
    }
    Ok(request)
}

/// Exit status for a failed run.
fn exit_code(err: &anyhow::Error) -> u8 {
    let category = err
        .chain()
        .find_map(|e| e.downcast_ref::<DocParseError>())
        .map(DocParseError::category);
    match category {
        Some(ErrorCategory::InvalidInput) => 2,
        Some(ErrorCategory::ConversionFailure) => 3,
        Some(ErrorCategory::UpstreamFailure) => 4,
        Some(ErrorCategory::MalformedResponse) => 5,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_event_only_clears_spinner() {
        let cb = CliProgressCallback {
            bar: ProgressBar::hidden(),
        };
        cb.on_extraction_error("Conversion failed\n  text: no text\n  vision: render");
        assert!(cb.bar.is_finished());
    }

    #[test]
    fn exit_codes_follow_error_category() {
        let too_large: anyhow::Error = DocParseError::FileTooLarge {
            size_bytes: 10,
            limit_mb: 1,
        }
        .into();
        assert_eq!(exit_code(&too_large), 2);

        let malformed: anyhow::Error = DocParseError::MalformedResponse {
            detail: "not json".into(),
        }
        .into();
        assert_eq!(exit_code(&malformed.context("while parsing")), 5);

        assert_eq!(exit_code(&anyhow::anyhow!("other")), 1);
    }
}
