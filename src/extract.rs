use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::Result,
    eval::{self, EvalContext},
    packer,
    util::truncate_string,
};

pub mod decode;
pub mod patterns;

pub const DEFAULT_MAX_DECODE_DEPTH: usize = 3;

/// The strategy a finding came out of, in the order they are attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Evaluation,
    DirectMatch,
    FunctionBody,
    RawLiterals,
    Base64,
    RawFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A candidate stream URL
    Url,
    /// Printed result of evaluating the input
    Value,
    /// Intermediate text worth showing when nothing better turned up
    Artifact,
    /// The untouched input
    Raw,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Finding {
    pub stage: Stage,
    pub kind: FindingKind,
    pub value: String,
}

impl Finding {
    pub fn url(stage: Stage, value: impl Into<String>) -> Self {
        Self {
            stage,
            kind: FindingKind::Url,
            value: value.into(),
        }
    }

    pub fn artifact(stage: Stage, value: impl Into<String>) -> Self {
        Self {
            stage,
            kind: FindingKind::Artifact,
            value: value.into(),
        }
    }

    pub fn is_url(&self) -> bool {
        self.kind == FindingKind::Url
    }
}

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    pub context: EvalContext,
    pub max_decode_depth: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            context: EvalContext::default(),
            max_decode_depth: DEFAULT_MAX_DECODE_DEPTH,
        }
    }
}

/// Runs the extraction strategies over `input`, stopping at the first one that finds something
///
/// Function bodies and decoded base64 text without URLs are kept as artifacts while later
/// strategies run. The raw input is only returned when every strategy came up empty.
pub fn extract(input: &str, options: &ExtractOptions) -> Vec<Finding> {
    match evaluate(input, &options.context) {
        Ok(findings) if !findings.is_empty() => return findings,
        Ok(_) => debug!("Evaluation produced nothing printable"),
        Err(e) => warn!("{e}"),
    }

    let urls = patterns::m3u8_urls(input);
    if !urls.is_empty() {
        info!("Found {} URLs directly in the packed JavaScript", urls.len());
        return urls_from(Stage::DirectMatch, urls);
    }

    let mut findings = Vec::new();
    if let Some(body) = patterns::function_body(input) {
        debug!("Function body extracted: {}", truncate_string(body, 100));
        findings.push(Finding::artifact(Stage::FunctionBody, body));

        let urls = patterns::layered_urls(body);
        if !urls.is_empty() {
            info!("Found {} URLs in function body", urls.len());
            findings.extend(urls_from(Stage::FunctionBody, urls));
            return findings;
        }
    } else {
        let urls = patterns::layered_urls(input);
        if !urls.is_empty() {
            info!("Found {} potential URLs in the raw input", urls.len());
            return urls_from(Stage::RawLiterals, urls);
        }
    }

    findings.extend(decode::search(input, options.max_decode_depth));

    if findings.is_empty() {
        debug!("Every strategy failed, falling back to the raw input");
        findings.push(Finding {
            stage: Stage::RawFallback,
            kind: FindingKind::Raw,
            value: input.to_string(),
        });
    }

    findings
}

/// Evaluates the input, unpacking P.A.C.K.E.R. invocations instead of running them
#[instrument(skip_all)]
fn evaluate(input: &str, context: &EvalContext) -> Result<Vec<Finding>> {
    if packer::detect(input) {
        let unpacked = packer::unpack(input)?;
        info!("Unpacked script: {}", truncate_string(&unpacked, 100));

        let mut findings = vec![Finding {
            stage: Stage::Evaluation,
            kind: FindingKind::Value,
            value: unpacked.clone(),
        }];
        findings.extend(urls_from(Stage::Evaluation, patterns::m3u8_urls(&unpacked)));
        return Ok(findings);
    }

    let value = eval::evaluate(input, context)?;
    if value.is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Finding {
        stage: Stage::Evaluation,
        kind: FindingKind::Value,
        value: value.to_string(),
    }])
}

fn urls_from(stage: Stage, urls: Vec<String>) -> Vec<Finding> {
    urls.into_iter().map(|u| Finding::url(stage, u)).collect()
}
