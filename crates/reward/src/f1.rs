use std::collections::{BTreeMap, HashSet};

/// Entity F1 over (name -> type) dictionaries. A prediction is a true
/// positive only when the name exists in the ground truth and the type
/// matches exactly; a known name with the wrong type counts as a false
/// positive, not partial credit.
pub fn entity_f1(pred: &BTreeMap<String, String>, gold: &BTreeMap<String, String>) -> f64 {
    let mut true_positives = 0usize;
    let mut false_positives = 0usize;
    let mut false_negatives = 0usize;

    for (name, pred_type) in pred {
        match gold.get(name) {
            Some(gold_type) if gold_type == pred_type => true_positives += 1,
            _ => false_positives += 1,
        }
    }

    for name in gold.keys() {
        if !pred.contains_key(name) {
            false_negatives += 1;
        }
    }

    f1_from_counts(true_positives, false_positives, false_negatives)
}

/// Relationship F1 over exact-match tuples. No partial credit for matching
/// a subset of fields; order of the relationship lists is irrelevant.
pub fn relationship_f1(pred: &[Vec<String>], gold: &[Vec<String>]) -> f64 {
    let pred_set: HashSet<&[String]> = pred.iter().map(|t| t.as_slice()).collect();
    let gold_set: HashSet<&[String]> = gold.iter().map(|t| t.as_slice()).collect();

    let true_positives = pred_set.intersection(&gold_set).count();
    let false_positives = pred_set.difference(&gold_set).count();
    let false_negatives = gold_set.difference(&pred_set).count();

    f1_from_counts(true_positives, false_positives, false_negatives)
}

pub fn f1_from_counts(tp: usize, fp: usize, fn_: usize) -> f64 {
    let precision = if tp + fp > 0 {
        tp as f64 / (tp + fp) as f64
    } else {
        0.0
    };
    let recall = if tp + fn_ > 0 {
        tp as f64 / (tp + fn_) as f64
    } else {
        0.0
    };

    if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    }
}
