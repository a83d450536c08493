use tracing::warn;

use crate::llm::{
    build_no_rag_prompt, build_rag_prompt, parse_generation, GenerationOutcome, OllamaClient,
};

/// Generate a synthetic description from the title and body alone
pub async fn generate_no_context(
    client: &OllamaClient,
    title: &str,
    description: &str,
    model: &str,
) -> GenerationOutcome {
    let prompt = build_no_rag_prompt(title, description);
    run_generation(client, model, &prompt).await
}

/// Generate a synthetic description conditioned on retrieved context
pub async fn generate_with_context(
    client: &OllamaClient,
    title: &str,
    description: &str,
    context: &[String],
    model: &str,
) -> GenerationOutcome {
    let prompt = build_rag_prompt(title, description, context);
    run_generation(client, model, &prompt).await
}

async fn run_generation(client: &OllamaClient, model: &str, prompt: &str) -> GenerationOutcome {
    let text = match client.generate(model, prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!(model, "generation request failed: {}", e);
            return GenerationOutcome::Unavailable(e.to_string());
        }
    };

    let outcome = parse_generation(&text);
    match &outcome {
        GenerationOutcome::EmptyResponse => warn!(model, "model returned no text"),
        GenerationOutcome::Malformed(raw) => {
            warn!(model, raw = %raw, "could not parse model output as JSON")
        }
        _ => {}
    }
    outcome
}
