pub mod llm;
pub mod prompt;
pub mod repair;
pub mod retry;
pub mod schema;

pub use llm::{ChatClient, ChatOutcome};
pub use repair::{parse_extraction, parse_object, repair_brackets};
pub use retry::RetryPolicy;
pub use schema::{ChatTurn, Document, EntityRow, Extraction, RelationshipRow, TraceRecord};

use anyhow::{Context, Result};
use tracing::debug;

/// Everything downstream needs from one document: the structured
/// extraction plus the trace record for the JSONL log.
#[derive(Debug, Clone)]
pub struct DocumentExtraction {
    pub extraction: Extraction,
    pub trace: TraceRecord,
}

pub struct Extractor {
    client: ChatClient,
    retry: RetryPolicy,
}

impl Extractor {
    pub fn new(client: ChatClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// The fixed two-turn conversation sent for every document.
    pub fn conversation(content: &str) -> Vec<ChatTurn> {
        vec![
            ChatTurn {
                role: "system".to_string(),
                content: "You are a helpful assistant".to_string(),
            },
            ChatTurn {
                role: "user".to_string(),
                content: prompt::build_extraction_prompt(content),
            },
        ]
    }

    /// Call the model, retried per the policy.
    pub async fn respond(&self, conversation: &[ChatTurn]) -> Result<ChatOutcome> {
        self.retry
            .retry("chat_completion", || self.client.complete(conversation))
            .await
    }

    /// Extract entities and relationships from one document. A response
    /// that cannot be parsed even after bracket repair is an error the
    /// caller records and moves past.
    pub async fn extract_document(&self, id: &str, content: &str) -> Result<DocumentExtraction> {
        let conversation = Self::conversation(content);
        let outcome = self
            .respond(&conversation)
            .await
            .with_context(|| format!("chat completion failed for document {}", id))?;

        debug!(id = id, response_len = outcome.content.len(), "got model response");
        assemble(id, conversation, outcome)
    }
}

/// Turn a raw model outcome into a parsed extraction plus its trace record.
/// Responses wrapped in prose or code fences are trimmed to the outermost
/// brace span before parsing.
pub fn assemble(
    id: &str,
    conversation: Vec<ChatTurn>,
    outcome: ChatOutcome,
) -> Result<DocumentExtraction> {
    let candidate = repair::trim_to_braces(&outcome.content);
    let extraction = repair::parse_extraction(candidate)
        .with_context(|| format!("no extractable content for document {}", id))?;

    Ok(DocumentExtraction {
        extraction,
        trace: TraceRecord {
            id: id.to_string(),
            conversation,
            response: outcome.content,
            reasoner: outcome.reasoning,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_parses_wrapped_response() {
        let conversation = Extractor::conversation("some abstract");
        let outcome = ChatOutcome {
            content: "```json\n{\"Entities\": {\"fever\": \"symptom\"}, \"Relationships\": []}\n```"
                .to_string(),
            reasoning: Some("thinking...".to_string()),
        };

        let result = assemble("doc9", conversation, outcome).unwrap();
        assert_eq!(result.extraction.entities["fever"], "symptom");
        assert_eq!(result.trace.id, "doc9");
        assert_eq!(result.trace.reasoner.as_deref(), Some("thinking..."));
    }

    #[test]
    fn test_assemble_rejects_unrecoverable_response() {
        let outcome = ChatOutcome {
            content: "I could not find any entities.".to_string(),
            reasoning: None,
        };
        assert!(assemble("doc9", Vec::new(), outcome).is_err());
    }
}
