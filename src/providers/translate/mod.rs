
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::http::HttpClient;
use super::{ProviderError, Translator};
use crate::config::HttpConfig;
use crate::language::Language;

const PROVIDER: &str = "google-translate";

/// The public endpoint rejects queries much above 5000 characters
const MAX_QUERY_CHARS: usize = 4500;

/// Google Translate via the keyless `translate_a/single` web endpoint
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    http: HttpClient,
    base_url: Url,
}

impl GoogleTranslator {
    #[inline]
    pub fn new(config: &HttpConfig, base_url: Url) -> Self {
        Self {
            http: HttpClient::new(PROVIDER, config),
            base_url,
        }
    }

    fn translate_piece(
        &self,
        url: &Url,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, ProviderError> {
        let response: Value = self.http.get_json(
            url,
            &[
                ("client", "gtx"),
                ("sl", source),
                ("tl", target),
                ("dt", "t"),
                ("q", text),
            ],
        )?;
        parse_translation(&response)
    }
}

impl Translator for GoogleTranslator {
    fn translate(
        &self,
        text: &str,
        source: Option<Language>,
        target: Language,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let url = self
            .base_url
            .join("/translate_a/single")
            .map_err(|e| ProviderError::malformed(PROVIDER, format!("Failed to build URL: {}", e)))?;
        let source_code = source.map_or("auto", Language::code);

        debug!(
            "Translating {} chars from {} to {}",
            text.chars().count(),
            source_code,
            target.code()
        );

        let mut translated = String::with_capacity(text.len());
        for piece in split_for_translation(text, MAX_QUERY_CHARS) {
            translated.push_str(&self.translate_piece(&url, &piece, source_code, target.code())?);
        }
        Ok(translated)
    }
}

/// Response shape: `[[["translated", "original", ...], ...], null, "tr", ...]`
fn parse_translation(response: &Value) -> Result<String, ProviderError> {
    let segments = response
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| ProviderError::malformed(PROVIDER, "missing translation segments"))?;

    Ok(segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect())
}

/// Split on line boundaries into pieces of at most `limit` characters.
/// Concatenating the pieces gives back the input.
fn split_for_translation(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for line in text.split_inclusive('\n') {
        let line_chars = line.chars().count();

        if current_chars + line_chars > limit && !current.is_empty() {
            pieces.push(std::mem::take(&mut current));
            current_chars = 0;
        }

        if line_chars > limit {
            let chars: Vec<char> = line.chars().collect();
            for window in chars.chunks(limit) {
                pieces.push(window.iter().collect());
            }
            continue;
        }

        current.push_str(line);
        current_chars += line_chars;
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}
