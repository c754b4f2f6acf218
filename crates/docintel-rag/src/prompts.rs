//! Prompt templates keyed by query intent.
//!
//! Templates are plain strings with `{context}` and `{question}`
//! placeholders. A library starts from the built-in set and can be
//! overridden from a TOML file:
//!
//! ```toml
//! [templates]
//! definition = "Define it.\n{context}\nQ: {question}\nA:"
//! default = "..."
//! ```

use figment::providers::{Format, Toml};
use figment::Figment;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use docintel_core::error::{Error, Result};
use docintel_core::types::QueryType;

const CONTEXT_SLOT: &str = "{context}";
const QUESTION_SLOT: &str = "{question}";
const DEFAULT_KEY: &str = "default";

const DEFAULT_TEMPLATE: &str = "You are a helpful assistant that answers questions based on the provided context.

Context:
{context}

Question: {question}

Instructions:
- Answer the question using ONLY the information from the context above
- Be concise and accurate
- If the context doesn't contain enough information, say so
- Include relevant details and examples when available

Answer:";

fn builtin(query_type: QueryType) -> String {
    let (role, instructions): (&str, [&str; 4]) = match query_type {
        QueryType::Factual => (
            "You are a precise assistant providing factual answers.",
            ["Provide a direct, factual answer", "Use exact information from the context", "Be concise but complete", "Cite specific details when relevant"],
        ),
        QueryType::Comparison => (
            "You are an analytical assistant comparing concepts.",
            ["Compare the items systematically", "Highlight both similarities and differences", "Use a structured format (bullet points or table)", "Be objective and balanced"],
        ),
        QueryType::Summary => (
            "You are an expert at summarizing information.",
            ["Provide a concise summary covering main points", "Use bullet points or numbered lists for clarity", "Maintain the key information hierarchy", "Keep it comprehensive but brief"],
        ),
        QueryType::Explanation => (
            "You are a tutor explaining concepts clearly.",
            ["Explain the concept thoroughly", "Include reasoning and mechanisms", "Use examples when available", "Break down complex ideas into understandable parts"],
        ),
        QueryType::Listing => (
            "You are an assistant creating comprehensive lists.",
            ["Create a well-organized list", "Include all relevant items from the context", "Group or categorize if appropriate", "Be complete and systematic"],
        ),
        QueryType::Procedural => (
            "You are a guide providing step-by-step instructions.",
            ["Provide clear, sequential steps", "Number each step", "Include important details and warnings", "Make it actionable and practical"],
        ),
        QueryType::Conceptual => (
            "You are an expert explaining relationships and connections.",
            ["Explain the relationships between concepts", "Show how ideas connect and influence each other", "Provide a holistic understanding", "Use analogies if helpful"],
        ),
        QueryType::Definition => (
            "You are a dictionary providing clear definitions.",
            ["Provide a clear, precise definition", "Include the essential characteristics", "Add context or examples if helpful", "Keep it concise but complete"],
        ),
    };
    let bullets: Vec<String> = instructions.iter().map(|i| format!("- {i}")).collect();
    format!("{role}\n\nContext:\n{CONTEXT_SLOT}\n\nQuestion: {QUESTION_SLOT}\n\nInstructions:\n{}\n\nAnswer:", bullets.join("\n"))
}

#[derive(Debug, Deserialize)]
struct PromptFile {
    #[serde(default)]
    templates: BTreeMap<String, String>,
}

/// Owned set of templates, one per intent plus a default.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    templates: HashMap<QueryType, String>,
    default: String,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self {
            templates: QueryType::ALL.into_iter().map(|qt| (qt, builtin(qt))).collect(),
            default: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptLibrary {
    pub fn new() -> Self { Self::default() }

    /// Built-in templates overridden by the `[templates]` table of a TOML
    /// file. Keys are intent names (`definition`, `listing`, ...) or
    /// `default`.
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::NotFound(format!("prompt file {}", path.display())));
        }
        let file: PromptFile = Figment::from(Toml::file(path))
            .extract()
            .map_err(|e| Error::InvalidConfig(format!("{}: {e}", path.display())))?;
        let mut library = Self::default();
        for (key, template) in file.templates {
            if key == DEFAULT_KEY {
                library.set_default(template)?;
                continue;
            }
            let query_type = QueryType::ALL
                .into_iter()
                .find(|qt| qt.as_str() == key)
                .ok_or_else(|| Error::InvalidConfig(format!("unknown prompt template '{key}'")))?;
            library.set(query_type, template)?;
        }
        Ok(library)
    }

    pub fn set(&mut self, query_type: QueryType, template: impl Into<String>) -> Result<()> {
        let template = checked(template.into())?;
        self.templates.insert(query_type, template);
        Ok(())
    }

    pub fn set_default(&mut self, template: impl Into<String>) -> Result<()> {
        self.default = checked(template.into())?;
        Ok(())
    }

    /// Template for an intent; the default template when there is none.
    pub fn template(&self, query_type: Option<QueryType>) -> &str {
        query_type.and_then(|qt| self.templates.get(&qt)).map_or(self.default.as_str(), String::as_str)
    }

    pub fn render(&self, query_type: Option<QueryType>, context: &str, question: &str) -> String {
        render(self.template(query_type), context, question)
    }
}

fn checked(template: String) -> Result<String> {
    if !template.contains(CONTEXT_SLOT) || !template.contains(QUESTION_SLOT) {
        return Err(Error::InvalidConfig(format!("prompt template must contain {CONTEXT_SLOT} and {QUESTION_SLOT}")));
    }
    Ok(template)
}

/// Fill both slots in one pass so braces inside the context are left alone.
pub fn render(template: &str, context: &str, question: &str) -> String {
    template
        .split(CONTEXT_SLOT)
        .map(|part| part.replace(QUESTION_SLOT, question))
        .collect::<Vec<_>>()
        .join(context)
}
