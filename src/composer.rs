use async_trait::async_trait;
use serde::Deserialize;

use crate::chunking::TextChunk;
use crate::error::ProviderError;

/// What the language model produced for one question
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub answer: String,
    /// 0-based positions into the context passed to `compose`, in citation
    /// order; empty when the model did not say which passages it used
    pub cited: Vec<usize>,
}

/// Produces a grounded answer from a question and retrieved context
#[async_trait]
pub trait AnswerComposer: Send + Sync {
    async fn compose(
        &self,
        question: &str,
        context: &[&TextChunk],
    ) -> Result<Composition, ProviderError>;
}

/// Build the question-answering prompt. Passages are numbered from 1.
pub fn build_prompt(question: &str, context: &[&TextChunk]) -> String {
    let passages = context
        .iter()
        .enumerate()
        .map(|(idx, chunk)| {
            format!(
                "[{}] (page {})\n{}",
                idx + 1,
                chunk.provenance.page,
                chunk.text.trim()
            )
        })
        .collect::<Vec<String>>()
        .join("\n\n");

    format!(
        "You answer questions about a candidate's resume using only the numbered passages below. \
If the passages do not contain the answer, say that you don't know.\n\n\
Passages:\n{passages}\n\n\
Question: {question}\n\n\
Reply with a JSON object of the form {{\"answer\": \"<your answer>\", \"sources\": [<numbers of the passages you used>]}} and nothing else."
    )
}

#[derive(Deserialize)]
struct Reply {
    answer: String,
    #[serde(default)]
    sources: Vec<serde_json::Value>,
}

/// Parse the model's JSON reply, bare or inside a Markdown code fence.
///
/// Citations outside `1..=passages` or that are not integers are dropped.
pub fn parse_reply(raw: &str, passages: usize) -> Result<Composition, ProviderError> {
    let body = strip_code_fence(raw.trim());
    let reply: Reply = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("model reply is not valid JSON: {e}")))?;

    let cited = reply
        .sources
        .iter()
        .filter_map(|value| match value {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().trim_matches(['[', ']']).parse().ok(),
            _ => None,
        })
        .filter(|&n| n >= 1 && n as usize <= passages)
        .map(|n| n as usize - 1)
        .collect();

    Ok(Composition {
        answer: reply.answer.trim().to_string(),
        cited,
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // drop an optional language tag on the opening line
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
