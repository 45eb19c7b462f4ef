//! docauth-ai - Document authenticity analyzer
//!
//! Reads one document, runs the analysis pipeline and prints the
//! `AnalysisReport` as JSON on stdout. Logs go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use docauth_ai::config::AnalyzerSettings;
use docauth_ai::DocumentAnalyzer;
use docauth_common::config::resolve_toml_config;
use docauth_common::logging::init_tracing;
use std::path::{Path, PathBuf};
use tracing::info;

const VERSION_INFO: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIMESTAMP"),
    ", ",
    env!("BUILD_PROFILE"),
    ")"
);

#[derive(Parser)]
#[command(name = "docauth-ai", version = VERSION_INFO, about = "Document authenticity analyzer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one document image or PDF
    Analyze {
        /// Document to analyze
        file: PathBuf,

        /// Mime type (sniffed from content when omitted)
        #[arg(long)]
        mime_type: Option<String>,

        /// TOML config file (overrides discovery)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip the generative signal
        #[arg(long)]
        no_generative: bool,

        /// Single-line JSON output
        #[arg(long)]
        compact: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            file,
            mime_type,
            config,
            no_generative,
            compact,
        } => analyze(&file, mime_type, config.as_deref(), no_generative, compact).await,
    }
}

async fn analyze(
    file: &Path,
    mime_type: Option<String>,
    config_path: Option<&Path>,
    no_generative: bool,
    compact: bool,
) -> Result<()> {
    let toml_config = resolve_toml_config(config_path)?;
    init_tracing(&toml_config.logging)?;

    info!("Starting docauth-ai v{}", VERSION_INFO);

    let mut settings = AnalyzerSettings::resolve(&toml_config)?;
    if no_generative {
        info!("Generative signal disabled by --no-generative");
        settings = settings.without_generative();
    }
    let analyzer = DocumentAnalyzer::from_settings(&settings);

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mime = match mime_type {
        Some(mime) => mime,
        None => detect_mime(file, &bytes)?,
    };
    info!(file = %file.display(), mime = %mime, "Document loaded");

    let report = analyzer
        .analyze(bytes, &mime)
        .await
        .with_context(|| format!("Analysis of {} failed", file.display()))?;

    let json = if compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", json);
    Ok(())
}

/// Content sniffing first, file extension second
fn detect_mime(file: &Path, bytes: &[u8]) -> Result<String> {
    if let Some(kind) = infer::get(bytes) {
        return Ok(kind.mime_type().to_string());
    }

    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let mime = match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("pdf") => "application/pdf",
        _ => bail!(
            "Cannot determine mime type of {}; pass --mime-type",
            file.display()
        ),
    };
    Ok(mime.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_mime_sniffs_content() {
        let png_header = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(detect_mime(Path::new("scan.bin"), &png_header).unwrap(), "image/png");

        let pdf_header = b"%PDF-1.7\n";
        assert_eq!(detect_mime(Path::new("doc"), pdf_header).unwrap(), "application/pdf");
    }

    #[test]
    fn test_detect_mime_extension_fallback() {
        assert_eq!(detect_mime(Path::new("a/B.TIF"), b"??").unwrap(), "image/tiff");
        assert_eq!(detect_mime(Path::new("x.jpg"), b"").unwrap(), "image/jpeg");
        assert!(detect_mime(Path::new("notes.txt"), b"hello").is_err());
    }

    #[test]
    fn test_version_info_carries_build_identification() {
        assert!(VERSION_INFO.starts_with(env!("CARGO_PKG_VERSION")));
        assert!(VERSION_INFO.contains(env!("BUILD_PROFILE")));
        let timestamp = env!("BUILD_TIMESTAMP");
        assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok(), "{}", timestamp);
        assert!(timestamp.ends_with('Z'));
        assert!(!env!("GIT_HASH").is_empty());
    }

    #[test]
    fn test_cli_parses_analyze() {
        let cli = Cli::try_parse_from([
            "docauth-ai",
            "analyze",
            "diploma.png",
            "--no-generative",
            "--compact",
        ])
        .unwrap();
        let Command::Analyze {
            file,
            no_generative,
            compact,
            mime_type,
            ..
        } = cli.command;
        assert_eq!(file, PathBuf::from("diploma.png"));
        assert!(no_generative && compact);
        assert!(mime_type.is_none());
    }
}
