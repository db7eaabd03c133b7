#[cfg(test)]
mod tests;

use std::str::FromStr;

use crate::config::ConfigError;
use crate::language::Language;

pub const CONTEXT_PLACEHOLDER: &str = "{context}";
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Turkish chef-assistant instructions used when no custom template is configured
pub const DEFAULT_TEMPLATE: &str = "
Sen bir şef asistanısın. Aşağıda yoğurtla ilgili tarif bilgileri içeren bir metin var:

{context}

Kullanıcının verdiği malzemelere uygun, sadece yoğurt içeren tarifler öner.
Türk mutfağına öncelik ver. Malzeme listesi ve yapılış adımlarını yaz.
Sade, akıcı ve kullanıcı dostu bir dille yaz. Gerekiyorsa alternatif malzemeler de öner.

Malzemeler: {question}
";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Context,
    Question,
}

/// Prompt with `{context}` and `{question}` slots.
///
/// The template is split into segments once so that braces inside the
/// retrieved context or the question are never mistaken for placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template, requiring both placeholders
    #[inline]
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        for placeholder in [CONTEXT_PLACEHOLDER, QUESTION_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(ConfigError::InvalidTemplate(placeholder));
            }
        }
        Ok(Self {
            segments: segments(template),
        })
    }

    /// Fill the slots. With a `language`, the model is also told which
    /// language to answer in.
    #[inline]
    pub fn render(&self, context: &str, question: &str, language: Option<Language>) -> String {
        let mut prompt = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => prompt.push_str(text),
                Segment::Context => prompt.push_str(context),
                Segment::Question => prompt.push_str(question),
            }
        }

        if let Some(language) = language {
            let trimmed = prompt.trim_end().len();
            prompt.truncate(trimmed);
            prompt.push_str("\n\nRespond in ");
            prompt.push_str(language.english_name());
            prompt.push_str(".\n");
        }

        prompt
    }
}

impl Default for PromptTemplate {
    #[inline]
    fn default() -> Self {
        Self {
            segments: segments(DEFAULT_TEMPLATE),
        }
    }
}

impl FromStr for PromptTemplate {
    type Err = ConfigError;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn segments(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut rest = template;

    loop {
        let next = [
            (CONTEXT_PLACEHOLDER, Segment::Context),
            (QUESTION_PLACEHOLDER, Segment::Question),
        ]
        .into_iter()
        .filter_map(|(placeholder, segment)| {
            rest.find(placeholder)
                .map(|position| (position, placeholder.len(), segment))
        })
        .min_by_key(|(position, _, _)| *position);

        let Some((position, length, segment)) = next else {
            break;
        };

        let (literal, tail) = rest.split_at(position);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal.to_string()));
        }
        segments.push(segment);
        rest = tail.split_at(length).1;
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }
    segments
}
