pub mod judge;
pub mod metrics;
pub mod records;
pub mod report;

pub use judge::{EntityJudgment, Judge, LlmJudge, RelationshipJudgment, Verdict};
pub use metrics::{CategoryCounts, Metrics, print_metrics_table};
pub use records::{EvalDocument, common_ids, load_gold, load_test};

use anyhow::Result;
use judge::Verdict::Correct;
use std::collections::HashMap;
use tracing::{info, warn};

/// Everything one evaluation run produces: aggregate counts per category
/// plus the per-row judgments for the report sheets.
pub struct EvalOutcome {
    pub entity_counts: CategoryCounts,
    pub relationship_counts: CategoryCounts,
    pub entity_judgments: Vec<EntityJudgment>,
    pub relationship_judgments: Vec<RelationshipJudgment>,
}

/// Compare model output against the gold standard over the id
/// intersection of the two files.
pub async fn evaluate(
    gold: &HashMap<String, EvalDocument>,
    test: &HashMap<String, EvalDocument>,
    judge: &Judge,
) -> Result<EvalOutcome> {
    let ids = common_ids(gold, test);
    info!(documents = ids.len(), "evaluating common documents");

    let mut outcome = EvalOutcome {
        entity_counts: CategoryCounts::default(),
        relationship_counts: CategoryCounts::default(),
        entity_judgments: Vec::new(),
        relationship_judgments: Vec::new(),
    };

    for id in &ids {
        let gold_doc = &gold[id];
        let test_doc = &test[id];

        // A judge failure on one document (e.g. the LLM judge exhausting
        // its retries) costs that document its correct verdicts, never
        // the whole run.
        let judgments = match judge
            .judge_entities(&gold_doc.entities, &test_doc.entities)
            .await
        {
            Ok(judgments) => judgments,
            Err(e) => {
                warn!(id = %id, error = %e, "entity judging failed; no rows counted correct");
                Vec::new()
            }
        };
        let right = judgments.iter().filter(|j| j.verdict == Correct).count();
        outcome
            .entity_counts
            .add(right, gold_doc.entities.len(), test_doc.entities.len());
        outcome.entity_judgments.extend(judgments);

        let judgments = match judge
            .judge_relationships(&gold_doc.relationships, &test_doc.relationships)
            .await
        {
            Ok(judgments) => judgments,
            Err(e) => {
                warn!(id = %id, error = %e, "relationship judging failed; no rows counted correct");
                Vec::new()
            }
        };
        let right = judgments.iter().filter(|j| j.verdict == Correct).count();
        outcome.relationship_counts.add(
            right,
            gold_doc.relationships.len(),
            test_doc.relationships.len(),
        );
        outcome.relationship_judgments.extend(judgments);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> EvalDocument {
        serde_json::from_str(json).unwrap()
    }

    #[tokio::test]
    async fn test_evaluate_exact_over_common_ids() {
        let mut gold = HashMap::new();
        gold.insert(
            "d1".to_string(),
            doc(r#"{
                "id": "d1",
                "entities": [
                    {"entity_type": "symptom", "name": "fever"},
                    {"entity_type": "drug", "name": "aspirin"}
                ],
                "relationships": [
                    {"entity_name1": "aspirin", "relationship": "treat", "entity_name2": "fever"}
                ]
            }"#),
        );
        gold.insert("only-gold".to_string(), doc(r#"{"id": "only-gold"}"#));

        let mut test = HashMap::new();
        test.insert(
            "d1".to_string(),
            doc(r#"{
                "id": "d1",
                "entities": [
                    {"entity_type": "symptom", "name": "fever"},
                    {"entity_type": "drug", "name": "ibuprofen"}
                ],
                "relationships": [
                    {"entity_name1": "aspirin", "relationship": "treat", "entity_name2": "fever"},
                    {"entity_name1": "aspirin", "relationship": "treat", "entity_name2": "chills"}
                ]
            }"#),
        );
        test.insert("only-test".to_string(), doc(r#"{"id": "only-test"}"#));

        let outcome = evaluate(&gold, &test, &Judge::Exact).await.unwrap();

        assert_eq!(outcome.entity_counts.right, 1);
        assert_eq!(outcome.entity_counts.gold_total, 2);
        assert_eq!(outcome.entity_counts.test_total, 2);

        assert_eq!(outcome.relationship_counts.right, 1);
        assert_eq!(outcome.relationship_counts.gold_total, 1);
        assert_eq!(outcome.relationship_counts.test_total, 2);

        let m = outcome.entity_counts.metrics();
        assert!((m.precision - 0.5).abs() < 1e-9);
        assert!((m.recall - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_judge_failure_does_not_abort_the_run() {
        let mut gold = HashMap::new();
        gold.insert(
            "d1".to_string(),
            doc(r#"{
                "id": "d1",
                "entities": [{"entity_type": "symptom", "name": "fever"}],
                "relationships": [
                    {"entity_name1": "aspirin", "relationship": "treat", "entity_name2": "fever"}
                ]
            }"#),
        );
        let mut test = HashMap::new();
        test.insert(
            "d1".to_string(),
            doc(r#"{
                "id": "d1",
                "entities": [{"entity_type": "symptom", "name": "fever"}],
                "relationships": [
                    {"entity_name1": "aspirin", "relationship": "treat", "entity_name2": "fever"}
                ]
            }"#),
        );

        // Nothing listens on this port; every judge call errors immediately.
        let client = extract::ChatClient::new(
            "http://127.0.0.1:1".to_string(),
            "unused".to_string(),
            "judge".to_string(),
        );
        let judge = Judge::Llm(LlmJudge::new(client).with_retry(extract::RetryPolicy::new(0, 1, 1)));

        let outcome = evaluate(&gold, &test, &judge).await.unwrap();

        assert_eq!(outcome.entity_counts.right, 0);
        assert_eq!(outcome.entity_counts.gold_total, 1);
        assert_eq!(outcome.entity_counts.test_total, 1);
        assert_eq!(outcome.relationship_counts.right, 0);
        assert_eq!(outcome.relationship_counts.gold_total, 1);
        assert!(outcome.entity_judgments.is_empty());
        assert!(outcome.relationship_judgments.is_empty());
    }
}
