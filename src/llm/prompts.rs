use crate::models::Feature;

/// Closing instruction appended to every prompt. The JSON schema itself lives
/// in the backend's model definition, not in the prompt.
pub const OUTPUT_INSTRUCTION: &str =
    "INSTRUCTIONS: Produce a JSON object following the rules defined in the Modelfile.";

/// Backend model names for one feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNames {
    pub no_rag: String,
    pub rag: String,
}

impl ModelNames {
    /// `{prefix}LLM_resumen_NO_RAG_T{feature}` and `{prefix}LLM_resumen_RAG_T{feature}`
    pub fn for_feature(prefix: &str, feature: Feature) -> Self {
        Self {
            no_rag: format!("{}LLM_resumen_NO_RAG_T{}", prefix, feature),
            rag: format!("{}LLM_resumen_RAG_T{}", prefix, feature),
        }
    }
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Prompt for a generation without retrieved context
pub fn build_no_rag_prompt(title: &str, description: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!("source_title: {}\n", title));
    prompt.push_str(&format!("target_word_count: {}\n", word_count(description)));
    prompt.push_str(OUTPUT_INSTRUCTION);
    prompt
}

/// Prompt for a generation conditioned on retrieved context
pub fn build_rag_prompt(title: &str, description: &str, context: &[String]) -> String {
    // A Vec<String> always serializes
    let context_block = serde_json::to_string(context).unwrap_or_else(|_| "[]".to_string());

    let mut prompt = String::new();
    prompt.push_str(&format!("source_title: {}\n", title));
    prompt.push_str(&format!("target_word_count: {}\n", word_count(description)));
    prompt.push_str(&format!("context: {}\n", context_block));
    prompt.push_str(OUTPUT_INSTRUCTION);
    prompt
}
