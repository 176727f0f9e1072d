// Prompt assembly and SQL extraction
// Turns a retrieved schema subset into the generation prompt and pulls the
// fenced SQL statement back out of the model's response.

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use itertools::Itertools;
use tracing::{debug, warn};

use crate::retriever::RetrievedSchema;

const SQL_FENCE_OPEN: &str = "```sql";
const FENCE: &str = "```";

/// Generation parameters forwarded to the language model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Text-completion seam. The production implementation is `OllamaClient`;
/// tests substitute canned responses.
pub trait CompletionOracle {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String>;
}

/// One generation attempt: the raw model output, and the SQL statement
/// extracted from it (absent when no fenced block was found).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuery {
    pub raw_response: String,
    pub sql: Option<String>,
}

/// Merge the retrieved schema into the prompt context block: table names,
/// then column documents, then sample queries under their header, separated
/// by blank lines. Purely textual; nothing is deduplicated or truncated
/// here — an oversized context surfaces as a model-side failure.
#[inline]
pub fn assemble_context(schema: &RetrievedSchema) -> String {
    let tables = schema.tables.iter().join("\n");
    let columns = schema.column_docs.iter().join("\n");
    let queries = schema.query_docs.iter().join("\n");

    format!("{tables}\n\n{columns}\n\nSample Queries:\n{queries}")
}

/// The fixed generation prompt.
#[inline]
pub fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Given the following table schema details:\n\
         {context}\n\
         \n\
         Generate a valid SQL query for the following question:\n\
         {question}\n\
         \n\
         Ensure that:\n\
         - Correct tables are used\n\
         - Joins are included if multiple tables are involved\n\
         - WHERE conditions are properly formatted\n\
         \n\
         Return ONLY the SQL query, surrounded by triple backticks (```sql ... ```). \
         Do not include any other text."
    )
}

/// Extract the first fenced SQL block from a model response.
///
/// The candidate is the text immediately after the first "```sql" marker,
/// up to the next triple-backtick, trimmed. A response without the marker,
/// or with nothing but whitespace inside the fence, yields `None`. When the
/// closing fence is missing, the rest of the response is taken as-is.
#[inline]
pub fn extract_sql(response: &str) -> Option<String> {
    let (_, rest) = response.split_once(SQL_FENCE_OPEN)?;
    let candidate = rest.split(FENCE).next().unwrap_or(rest).trim();

    if candidate.is_empty() {
        None
    } else {
        Some(candidate.to_string())
    }
}

/// Run one generation attempt for a question against the oracle.
///
/// Exactly one model call, no retry, no fallback heuristic: a response
/// without a fenced SQL block makes the question unanswerable.
#[inline]
pub fn generate_query<O: CompletionOracle + ?Sized>(
    oracle: &O,
    question: &str,
    context: &str,
    options: &CompletionOptions,
) -> Result<GeneratedQuery> {
    let prompt = build_prompt(question, context);
    debug!("Built generation prompt ({} bytes)", prompt.len());

    let raw_response = oracle
        .complete(&prompt, options)
        .context("Language model call failed")?;

    let sql = extract_sql(&raw_response);
    match &sql {
        Some(sql) => debug!("Extracted SQL statement ({} bytes)", sql.len()),
        None => warn!("No fenced SQL block found in model response"),
    }

    Ok(GeneratedQuery { raw_response, sql })
}
