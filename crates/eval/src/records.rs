use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// One annotated document from a gold or test JSONL file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalDocument {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub entities: Vec<EntityAnnotation>,
    #[serde(default)]
    pub relationships: Vec<RelationshipAnnotation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityAnnotation {
    pub entity_type: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipAnnotation {
    pub entity_name1: String,
    pub relationship: String,
    pub entity_name2: String,
}

/// Load the gold-standard file. Every line must parse; annotations are
/// lowercased wholesale so comparisons are case-insensitive downstream.
pub fn load_gold(path: &Path) -> Result<HashMap<String, EvalDocument>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read gold file {}", path.display()))?;

    let mut docs = HashMap::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let doc: EvalDocument = serde_json::from_str(&line.to_lowercase())
            .with_context(|| format!("bad gold record at {}:{}", path.display(), lineno + 1))?;
        docs.insert(doc.id.clone(), doc);
    }
    Ok(docs)
}

/// Load a model-output file. Unparseable lines are logged and skipped;
/// model output is allowed to be partially broken.
pub fn load_test(path: &Path) -> Result<HashMap<String, EvalDocument>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read test file {}", path.display()))?;

    let mut docs = HashMap::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<EvalDocument>(&line.to_lowercase()) {
            Ok(doc) => {
                docs.insert(doc.id.clone(), doc);
            }
            Err(e) => warn!(line = lineno + 1, error = %e, "skipping bad test record"),
        }
    }
    Ok(docs)
}

/// Ids present in both files, sorted for stable output.
pub fn common_ids(
    gold: &HashMap<String, EvalDocument>,
    test: &HashMap<String, EvalDocument>,
) -> Vec<String> {
    let mut ids: Vec<String> = gold.keys().filter(|id| test.contains_key(*id)).cloned().collect();
    ids.sort();
    ids
}

/// Trim and collapse internal whitespace. Annotations come from both human
/// curators and model output; spacing is the one difference that should
/// never count as an error.
pub fn normalize_term(term: &str) -> String {
    let re = Regex::new(r"\s+").unwrap();
    re.replace_all(term.trim(), " ").to_string()
}

/// Relation labels in model output use underscores (`is_symptom_of`); gold
/// annotations use spaces. Fold the test side onto the gold convention.
pub fn normalize_relation(label: &str) -> String {
    normalize_term(&label.replace('_', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("eval-records-{}-{}", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_gold_lowercases() {
        let path = temp_file(
            "gold.jsonl",
            r#"{"id": "D1", "content": "Text", "entities": [{"entity_type": "Drug", "name": "Aspirin"}], "relationships": []}"#,
        );
        let docs = load_gold(&path).unwrap();
        let doc = &docs["d1"];
        assert_eq!(doc.entities[0].entity_type, "drug");
        assert_eq!(doc.entities[0].name, "aspirin");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_test_skips_bad_lines() {
        let path = temp_file(
            "test.jsonl",
            "{\"id\": \"d1\"}\nnot json at all\n{\"id\": \"d2\"}\n",
        );
        let docs = load_test(&path).unwrap();
        assert_eq!(docs.len(), 2);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_common_ids_sorted_intersection() {
        let gold_path = temp_file("gold-ids.jsonl", "{\"id\": \"b\"}\n{\"id\": \"a\"}\n{\"id\": \"c\"}\n");
        let test_path = temp_file("test-ids.jsonl", "{\"id\": \"c\"}\n{\"id\": \"a\"}\n{\"id\": \"x\"}\n");
        let gold = load_gold(&gold_path).unwrap();
        let test = load_test(&test_path).unwrap();
        assert_eq!(common_ids(&gold, &test), vec!["a".to_string(), "c".to_string()]);
        let _ = std::fs::remove_file(&gold_path);
        let _ = std::fs::remove_file(&test_path);
    }

    #[test]
    fn test_normalization() {
        assert_eq!(normalize_term("  chest   pain "), "chest pain");
        assert_eq!(normalize_relation("is_symptom_of"), "is symptom of");
        assert_eq!(normalize_relation("treat"), "treat");
    }
}
