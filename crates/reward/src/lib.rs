pub mod f1;
pub mod format;

pub use f1::{entity_f1, f1_from_counts, relationship_f1};
pub use format::{answer_content, format_reward, think_length_reward};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Target character count for the reasoning trace.
pub const THINK_TARGET_LEN: usize = 4000;

/// Default blend between format compliance and extraction accuracy.
pub const DEFAULT_FORMAT_WEIGHT: f64 = 0.5;

/// Annotation payload shared by predictions and ground truth:
/// `{"Entities": {name: type}, "Relationships": [[5-tuple], ...]}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Annotation {
    #[serde(rename = "Entities", default)]
    entities: BTreeMap<String, String>,
    #[serde(rename = "Relationships", default)]
    relationships: Vec<Vec<String>>,
}

/// Reward breakdown handed to the RL trainer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub overall: f64,
    pub format: f64,
    pub accuracy: f64,
}

/// Mean of entity F1 and relationship F1 between the prediction's
/// answer-block and the annotated ground truth. Any structural problem -
/// missing answer tags, unparseable JSON on either side - yields 0.0
/// rather than an error: a malformed rollout is simply a worthless one.
pub fn accuracy_reward(predict_str: &str, ground_truth: &str) -> f64 {
    let Some(content) = format::answer_content(predict_str) else {
        return 0.0;
    };

    let Ok(pred) = serde_json::from_str::<Annotation>(content) else {
        return 0.0;
    };
    let Ok(gold) = serde_json::from_str::<Annotation>(ground_truth) else {
        return 0.0;
    };

    let entity = f1::entity_f1(&pred.entities, &gold.entities);
    let relationship = f1::relationship_f1(&pred.relationships, &gold.relationships);

    (entity + relationship) / 2.0
}

/// Combined reward: `(1 - w) * accuracy + w * format`, where the format
/// component blends the strict tag check with the think-length proximity.
pub fn compute_score(predict_str: &str, ground_truth: &str, format_weight: f64) -> ScoreBreakdown {
    let length_score = format::think_length_reward(predict_str, THINK_TARGET_LEN);
    let format_score = (format::format_reward(predict_str) + length_score) / 2.0;
    let accuracy_score = accuracy_reward(predict_str, ground_truth);

    ScoreBreakdown {
        overall: (1.0 - format_weight) * accuracy_score + format_weight * format_score,
        format: format_score,
        accuracy: accuracy_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND_TRUTH: &str = r#"{
        "Entities": {
            "headache": "Symptom",
            "fever": "Symptom"
        },
        "Relationships": [
            ["headache", "Symptom", "caused_by", "Virus", "influenza"]
        ]
    }"#;

    #[test]
    fn test_identical_prediction_scores_one() {
        let predict = format!("<answer>{GROUND_TRUTH}</answer>");
        assert_eq!(accuracy_reward(&predict, GROUND_TRUTH), 1.0);
    }

    #[test]
    fn test_partial_prediction() {
        let predict =
            r#"<answer>{"Entities": {"headache": "Symptom"}, "Relationships": []}</answer>"#;
        // entity f1 = 2*(1/1)*(1/2)/(1/1+1/2) = 2/3, relationship f1 = 0
        let score = accuracy_reward(predict, GROUND_TRUTH);
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_json_scores_zero() {
        assert_eq!(accuracy_reward("<answer>Invalid JSON</answer>", GROUND_TRUTH), 0.0);
    }

    #[test]
    fn test_missing_answer_block_scores_zero() {
        assert_eq!(accuracy_reward("no tags at all", GROUND_TRUTH), 0.0);
    }

    #[test]
    fn test_unparseable_ground_truth_scores_zero() {
        let predict = format!("<answer>{GROUND_TRUTH}</answer>");
        assert_eq!(accuracy_reward(&predict, "not json"), 0.0);
    }

    #[test]
    fn test_compute_score_blend() {
        let predict = format!("<think>because</think>\n<answer>{GROUND_TRUTH}</answer>");
        let score = compute_score(&predict, GROUND_TRUTH, DEFAULT_FORMAT_WEIGHT);

        assert_eq!(score.accuracy, 1.0);
        // strict tag check passes; think block is far below the target length
        let expected_format = (1.0 + think_length_reward(&predict, THINK_TARGET_LEN)) / 2.0;
        assert!((score.format - expected_format).abs() < 1e-9);
        assert!(
            (score.overall - (0.5 * score.accuracy + 0.5 * score.format)).abs() < 1e-9
        );
    }

    #[test]
    fn test_compute_score_never_errors_on_garbage() {
        let score = compute_score("}{[", "][", DEFAULT_FORMAT_WEIGHT);
        assert_eq!(score.accuracy, 0.0);
        assert_eq!(score.overall, 0.0);
    }
}
