use anyhow::Result;
use extract::{ChatClient, ChatTurn, RetryPolicy};
use serde::Serialize;
use std::collections::HashSet;

use crate::records::{
    EntityAnnotation, RelationshipAnnotation, normalize_relation, normalize_term,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EntityJudgment {
    pub entity_type: String,
    pub name: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelationshipJudgment {
    pub entity_name1: String,
    pub relationship: String,
    pub entity_name2: String,
    pub verdict: Verdict,
}

/// How a test row is verdicted against the gold rows of its document.
/// `Exact` is set membership after normalization; `Llm` delegates the
/// leniency judgment (abbreviations, parenthetical remarks) to the model.
pub enum Judge {
    Exact,
    Llm(LlmJudge),
}

pub struct LlmJudge {
    client: ChatClient,
    retry: RetryPolicy,
}

impl LlmJudge {
    pub fn new(client: ChatClient) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn ask(&self, prompt: String) -> Result<String> {
        let conversation = vec![
            ChatTurn {
                role: "system".to_string(),
                content: "You are a helpful assistant".to_string(),
            },
            ChatTurn {
                role: "user".to_string(),
                content: prompt,
            },
        ];
        let outcome = self
            .retry
            .retry("judge_completion", || self.client.complete(&conversation))
            .await?;
        Ok(outcome.content)
    }
}

impl Judge {
    pub async fn judge_entities(
        &self,
        gold: &[EntityAnnotation],
        test: &[EntityAnnotation],
    ) -> Result<Vec<EntityJudgment>> {
        match self {
            Judge::Exact => Ok(exact_entities(gold, test)),
            Judge::Llm(judge) => {
                let response = judge.ask(entity_prompt(gold, test)).await?;
                Ok(parse_entity_verdicts(&response))
            }
        }
    }

    pub async fn judge_relationships(
        &self,
        gold: &[RelationshipAnnotation],
        test: &[RelationshipAnnotation],
    ) -> Result<Vec<RelationshipJudgment>> {
        match self {
            Judge::Exact => Ok(exact_relationships(gold, test)),
            Judge::Llm(judge) => {
                let response = judge.ask(relationship_prompt(gold, test)).await?;
                Ok(parse_relationship_verdicts(&response))
            }
        }
    }
}

fn exact_entities(gold: &[EntityAnnotation], test: &[EntityAnnotation]) -> Vec<EntityJudgment> {
    let gold_set: HashSet<(String, String)> = gold
        .iter()
        .map(|e| (normalize_term(&e.entity_type), normalize_term(&e.name)))
        .collect();

    test.iter()
        .map(|e| {
            let key = (normalize_term(&e.entity_type), normalize_term(&e.name));
            EntityJudgment {
                entity_type: e.entity_type.clone(),
                name: e.name.clone(),
                verdict: if gold_set.contains(&key) {
                    Verdict::Correct
                } else {
                    Verdict::Incorrect
                },
            }
        })
        .collect()
}

fn exact_relationships(
    gold: &[RelationshipAnnotation],
    test: &[RelationshipAnnotation],
) -> Vec<RelationshipJudgment> {
    let gold_set: HashSet<(String, String, String)> = gold
        .iter()
        .map(|r| {
            (
                normalize_term(&r.entity_name1),
                normalize_relation(&r.relationship),
                normalize_term(&r.entity_name2),
            )
        })
        .collect();

    test.iter()
        .map(|r| {
            let key = (
                normalize_term(&r.entity_name1),
                normalize_relation(&r.relationship),
                normalize_term(&r.entity_name2),
            );
            RelationshipJudgment {
                entity_name1: r.entity_name1.clone(),
                relationship: r.relationship.clone(),
                entity_name2: r.entity_name2.clone(),
                verdict: if gold_set.contains(&key) {
                    Verdict::Correct
                } else {
                    Verdict::Incorrect
                },
            }
        })
        .collect()
}

fn entity_prompt(gold: &[EntityAnnotation], test: &[EntityAnnotation]) -> String {
    let gold_rows: Vec<String> = gold
        .iter()
        .map(|e| format!("{}|{}", e.entity_type, e.name))
        .collect();
    let test_rows: Vec<String> = test
        .iter()
        .map(|e| format!("{}|{}", e.entity_type, e.name))
        .collect();

    format!(
        r#"You are an adjudicator for entity recognition results. Judge each row of the model output against the standard answer and give a verdict.

## Notes
1. Base every judgment on the standard answer only; do not use your own knowledge
2. A row is correct when its subject agrees with the standard answer, ignoring case, abbreviations, and parenthetical remarks
3. Output a verdict for every row of the model output

## Data format
entity_type|entity_name

## Standard answer
{}

## Model output
{}

## Output format
entity_type|entity_name|verdict
disease|Gliomas|correct
treatment|conventional therapeutic strategies|incorrect
"#,
        gold_rows.join("\n"),
        test_rows.join("\n"),
    )
}

fn relationship_prompt(gold: &[RelationshipAnnotation], test: &[RelationshipAnnotation]) -> String {
    let gold_rows: Vec<String> = gold
        .iter()
        .map(|r| format!("{}|{}|{}", r.entity_name1, r.relationship, r.entity_name2))
        .collect();
    // Model output carries underscored relation labels; the standard answer
    // writes them with spaces. Align before the adjudicator sees them.
    let test_rows: Vec<String> = test
        .iter()
        .map(|r| {
            format!(
                "{}|{}|{}",
                r.entity_name1,
                normalize_relation(&r.relationship),
                r.entity_name2
            )
        })
        .collect();

    format!(
        r#"You are an adjudicator for knowledge graph relationship extraction results. Judge each row of the model output against the standard answer and give a verdict.

## Notes
1. Base every judgment on the standard answer only; do not use your own knowledge
2. A row is correct only when both entities and the relation agree with the standard answer; one mismatch makes it incorrect
3. Ignore case, abbreviations, and parenthetical remarks in entity and relation names
4. Output a verdict for every row of the model output

## Data format
entity_name1|relation|entity_name2

## Standard answer
{}

## Model output
{}

## Output format
entity_name1|relation|entity_name2|verdict
Cerebral atherosclerosis (AS)|is located in|aged brain|incorrect
"#,
        gold_rows.join("\n"),
        test_rows.join("\n"),
    )
}

fn verdict_from(label: &str) -> Verdict {
    if label.trim().starts_with("correct") {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}

/// Parse `type|name|verdict` rows out of a judge response, skipping the
/// header echo and anything that is not a well-formed row.
fn parse_entity_verdicts(response: &str) -> Vec<EntityJudgment> {
    let mut judgments = Vec::new();
    for line in response.lines() {
        let line = line.trim();
        if line.starts_with("entity_type|") || line.starts_with('|') || !line.contains('|') {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() == 3 {
            judgments.push(EntityJudgment {
                entity_type: fields[0].to_string(),
                name: fields[1].to_string(),
                verdict: verdict_from(fields[2]),
            });
        }
    }
    judgments
}

fn parse_relationship_verdicts(response: &str) -> Vec<RelationshipJudgment> {
    let mut judgments = Vec::new();
    for line in response.lines() {
        let line = line.trim();
        if line.starts_with("entity_name1|") || line.starts_with('|') || !line.contains('|') {
            continue;
        }
        let fields: Vec<&str> = line.split('|').collect();
        if fields.len() == 4 {
            judgments.push(RelationshipJudgment {
                entity_name1: fields[0].to_string(),
                relationship: fields[1].to_string(),
                entity_name2: fields[2].to_string(),
                verdict: verdict_from(fields[3]),
            });
        }
    }
    judgments
}
