use std::collections::HashSet;

use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};
use tracing::{debug, info, warn};

use super::{Finding, Stage, patterns};
use crate::{
    error::{Error, Result},
    util::truncate_string,
};

const PADDING_INDIFFERENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDING_INDIFFERENT);
const URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_INDIFFERENT);

/// Decodes one `atob` payload into UTF-8 text
///
/// # Errors
/// Errors when the payload is neither standard nor URL-safe base64, or does not decode to UTF-8
pub fn decode_payload(candidate: &str) -> Result<String> {
    let decode_error = |reason: String| Error::Decode {
        candidate: truncate_string(candidate, 60),
        reason,
    };

    let bytes = STANDARD
        .decode(candidate)
        .or_else(|_| URL_SAFE.decode(candidate))
        .map_err(|e| decode_error(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))
}

/// Follows decode calls in `text`, nesting up to `max_depth` levels deep
///
/// Every candidate yields either the URLs found inside it (or inside its nested
/// candidates) or, when there are none, its decoded text as an artifact.
pub fn search(text: &str, max_depth: usize) -> Vec<Finding> {
    let mut findings = Vec::new();
    walk(text, max_depth, &mut findings);

    let mut seen = HashSet::new();
    findings.retain(|f| seen.insert(f.clone()));
    findings
}

fn walk(text: &str, remaining_depth: usize, findings: &mut Vec<Finding>) {
    if remaining_depth == 0 {
        debug!("Reached maximum base64 nesting depth");
        return;
    }

    for candidate in patterns::decode_call_payloads(text) {
        let decoded = match decode_payload(candidate) {
            Ok(d) => d,
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };
        info!(
            "Successfully decoded base64 content: {}",
            truncate_string(&decoded, 100)
        );

        let mut urls = patterns::m3u8_urls(&decoded);
        if urls.is_empty() {
            urls = patterns::m3u8_literals(&decoded);
        }
        if !urls.is_empty() {
            findings.extend(urls.into_iter().map(|u| Finding::url(Stage::Base64, u)));
            continue;
        }

        let before = findings.len();
        walk(&decoded, remaining_depth - 1, findings);
        if !findings[before..].iter().any(Finding::is_url) {
            findings.insert(before, Finding::artifact(Stage::Base64, decoded));
        }
    }
}
