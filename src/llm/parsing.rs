use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// Placeholder recorded when the model omits the description field
pub const MISSING_DESCRIPTION: &str = "N/A";

/// One line of the backend's newline-delimited token stream
#[derive(Debug, Deserialize)]
struct Fragment {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    done: bool,
}

/// Reassembles a streamed generation from raw byte chunks.
///
/// Chunks may split a record anywhere, so bytes are buffered until a newline
/// completes a line. Lines that are not fragment records are skipped.
#[derive(Debug, Default)]
pub struct FragmentAssembler {
    buffer: Vec<u8>,
    text: String,
    done: bool,
    skipped: usize,
}

impl FragmentAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a raw chunk; returns true once the backend has signalled completion
    pub fn push_chunk(&mut self, chunk: &[u8]) -> bool {
        self.buffer.extend_from_slice(chunk);
        while !self.done {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.push_line(&String::from_utf8_lossy(&line));
        }
        self.done
    }

    /// Feed one complete line
    pub fn push_line(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() || self.done {
            return self.done;
        }
        match serde_json::from_str::<Fragment>(line) {
            Ok(fragment) => {
                if let Some(text) = fragment.response {
                    self.text.push_str(&text);
                }
                self.done = fragment.done;
            }
            Err(_) => self.skipped += 1,
        }
        self.done
    }

    /// Lines ignored because they were not fragment records
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Flush any unterminated trailing line and return the full text
    pub fn finish(mut self) -> String {
        if !self.buffer.is_empty() && !self.done {
            let rest = std::mem::take(&mut self.buffer);
            self.push_line(&String::from_utf8_lossy(&rest));
        }
        self.text
    }
}

/// Fold a sequence of stream lines into the generated text
pub fn assemble_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> String {
    lines
        .into_iter()
        .fold(FragmentAssembler::new(), |mut assembler, line| {
            assembler.push_line(line);
            assembler
        })
        .finish()
}

/// Remove a leading ```` ```json ```` / ```` ``` ```` marker and a trailing ```` ``` ````
pub fn strip_code_fences(text: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?m)^```(?:json)?[ \t]*\r?\n?|```[ \t]*$").expect("valid regex")
    });
    FENCE_RE.replace_all(text.trim(), "").trim().to_string()
}

/// Structured output of one successful generation
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedOutput {
    pub fields: Value,
}

impl GeneratedOutput {
    /// The generated description, or `N/A` when the model left it out
    pub fn synthetic_description(&self) -> String {
        match self.fields.get("synthetic_description") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => MISSING_DESCRIPTION.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// What one generation call produced
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Ok(GeneratedOutput),
    /// The text did not parse as JSON; carries the raw text
    Malformed(String),
    /// The stream carried no usable text
    EmptyResponse,
    /// The backend could not be reached or answered with an error
    Unavailable(String),
}

/// Wrap a scalar `changes_made` into a one-element list
pub fn normalize_fields(mut value: Value) -> Value {
    if let Some(obj) = value.as_object_mut() {
        if let Some(changes) = obj.get_mut("changes_made") {
            if changes.is_string() {
                let single = changes.take();
                *changes = Value::Array(vec![single]);
            }
        }
    }
    value
}

/// Interpret the reassembled text of a generation
pub fn parse_generation(raw: &str) -> GenerationOutcome {
    if raw.trim().is_empty() {
        return GenerationOutcome::EmptyResponse;
    }
    let body = strip_code_fences(raw);
    match serde_json::from_str::<Value>(&body) {
        Ok(value) => GenerationOutcome::Ok(GeneratedOutput {
            fields: normalize_fields(value),
        }),
        Err(_) => GenerationOutcome::Malformed(raw.to_string()),
    }
}
