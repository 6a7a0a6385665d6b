#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]
#![warn(clippy::perf)]
#![warn(clippy::complexity)]
#![warn(clippy::style)]
#![allow(clippy::multiple_crate_versions)]

use std::io::{Write, stdout};

use anyhow::{Context, Result, bail};
use clap::Parser;
use eval::{DEFAULT_USER_AGENT, EvalContext};
use extract::{DEFAULT_MAX_DECODE_DEPTH, ExtractOptions, Finding, FindingKind, Stage, extract};
use tracing::debug;

pub mod error;
pub mod eval;
pub mod extract;
pub mod packer;
pub mod util;

/// Extracts m3u8 stream URLs out of a packed / obfuscated player script
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Packed JavaScript to extract stream URLs from
    #[arg(allow_hyphen_values = true)]
    packed: Option<String>,

    /// Print findings as a JSON array instead of plain text
    #[arg(long)]
    json: bool,

    /// `navigator.userAgent` seen by evaluated expressions
    #[arg(long, env = "M3U8_UNPACK_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// `window.location.href` seen by evaluated expressions
    #[arg(long, env = "M3U8_UNPACK_LOCATION", default_value = "")]
    location: String,

    /// How many levels of base64 nested inside base64 to follow
    #[arg(long, env = "M3U8_UNPACK_MAX_DECODE_DEPTH", default_value_t = DEFAULT_MAX_DECODE_DEPTH)]
    max_decode_depth: usize,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    util::init_tracing();

    let args = Args::parse();
    let Some(packed) = args.packed.filter(|p| !p.is_empty()) else {
        bail!(error::Error::MissingInput);
    };

    let options = ExtractOptions {
        context: EvalContext::default()
            .with_user_agent(args.user_agent)
            .with_location_href(args.location),
        max_decode_depth: args.max_decode_depth,
    };
    debug!(?options, "Extracting from {} bytes of input", packed.len());

    let findings = extract(&packed, &options);

    let mut out = stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &findings).context("Serializing findings")?;
        writeln!(out).context("Writing findings")?;
    } else {
        print_findings(&mut out, &findings).context("Writing findings")?;
    }

    Ok(())
}

/// Prints findings line by line, with a heading whenever the stage or kind changes
fn print_findings(out: &mut impl Write, findings: &[Finding]) -> std::io::Result<()> {
    let mut previous = None;
    for finding in findings {
        let group = (finding.stage, finding.kind);
        if previous != Some(group) {
            if let Some(heading) = heading(finding.stage, finding.kind) {
                writeln!(out, "{heading}")?;
            }
            previous = Some(group);
        }
        writeln!(out, "{}", finding.value)?;
    }
    Ok(())
}

const fn heading(stage: Stage, kind: FindingKind) -> Option<&'static str> {
    Some(match (stage, kind) {
        (Stage::Evaluation, FindingKind::Value) => return None,
        (Stage::Evaluation, _) => "Found URLs in unpacked JavaScript:",
        (Stage::DirectMatch, _) => "Found URLs directly in the packed JavaScript:",
        (Stage::FunctionBody, FindingKind::Artifact) => "Function body extracted:",
        (Stage::FunctionBody, _) => "Found URLs in function body:",
        (Stage::RawLiterals, _) => "Found URLs in raw input:",
        (Stage::Base64, FindingKind::Artifact) => "Decoded base64 content:",
        (Stage::Base64, _) => "Found URLs in decoded base64 content:",
        (Stage::RawFallback, _) => "Raw packed JavaScript:",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(findings: &[Finding]) -> String {
        let mut out = Vec::new();
        print_findings(&mut out, findings).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn evaluated_value_is_printed_bare() {
        let findings = extract("'https://x.com/a.m3u8'", &ExtractOptions::default());
        assert_eq!(render(&findings), "https://x.com/a.m3u8\n");
    }

    #[test]
    fn groups_findings_under_headings() {
        let findings = [
            Finding::artifact(Stage::FunctionBody, "var a"),
            Finding::url(Stage::FunctionBody, "https://a.example/1.m3u8"),
            Finding::url(Stage::FunctionBody, "https://a.example/2.m3u8"),
        ];
        assert_eq!(
            render(&findings),
            "Function body extracted:\nvar a\nFound URLs in function body:\nhttps://a.example/1.m3u8\nhttps://a.example/2.m3u8\n"
        );
    }

    #[test]
    fn parses_arguments() {
        let args = Args::try_parse_from(["m3u8-unpack", "--json", "--max-decode-depth", "5", "x"])
            .unwrap();
        assert_eq!(args.packed.as_deref(), Some("x"));
        assert!(args.json);
        assert_eq!(args.max_decode_depth, 5);

        let args = Args::try_parse_from(["m3u8-unpack"]).unwrap();
        assert_eq!(args.packed, None);

        let args = Args::try_parse_from(["m3u8-unpack", "--json", "-'a' + 1"]).unwrap();
        assert_eq!(args.packed.as_deref(), Some("-'a' + 1"));
        assert!(args.json);
    }
}
