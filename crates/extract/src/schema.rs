use serde::{Deserialize, Serialize};

/// The structure the model is asked to emit: entity name -> entity type,
/// plus relationship 5-tuples [source_name, source_type, relation, target_name, target_type].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    #[serde(rename = "Entities", default)]
    pub entities: std::collections::BTreeMap<String, String>,
    #[serde(rename = "Relationships", default)]
    pub relationships: Vec<Vec<String>>,
}

/// One spreadsheet row per extracted entity, tagged with its source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRow {
    pub id: String,
    pub content: String,
    pub entity_type: String,
    pub name: String,
}

/// One spreadsheet row per extracted relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRow {
    pub id: String,
    pub content: String,
    pub entity_type_1: String,
    pub entity_name_1: String,
    pub relationship: String,
    pub entity_type_2: String,
    pub entity_name_2: String,
}

/// Bulk-job input: one document per JSONL line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: String,
}

/// One JSONL line per processed document: the full conversation, the raw
/// response text and the optional reasoning trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    pub id: String,
    pub conversation: Vec<ChatTurn>,
    pub response: String,
    pub reasoner: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }

    /// Flatten into tabular rows. Relationship tuples shorter than 5 fields
    /// are dropped rather than padded.
    pub fn into_rows(self, id: &str, content: &str) -> (Vec<EntityRow>, Vec<RelationshipRow>) {
        let entities = self
            .entities
            .into_iter()
            .map(|(name, entity_type)| EntityRow {
                id: id.to_string(),
                content: content.to_string(),
                entity_type,
                name,
            })
            .collect();

        let relationships = self
            .relationships
            .into_iter()
            .filter(|tuple| tuple.len() >= 5)
            .map(|tuple| RelationshipRow {
                id: id.to_string(),
                content: content.to_string(),
                entity_name_1: tuple[0].clone(),
                entity_type_1: tuple[1].clone(),
                relationship: tuple[2].clone(),
                entity_name_2: tuple[3].clone(),
                entity_type_2: tuple[4].clone(),
            })
            .collect();

        (entities, relationships)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_rows_field_order() {
        let extraction: Extraction = serde_json::from_str(
            r#"{
                "Entities": {"Lecanemab": "drug"},
                "Relationships": [["Lecanemab", "drug", "is_target_of", "Amyloid-β protofibrils", "target"]]
            }"#,
        )
        .unwrap();

        let (entities, relationships) = extraction.into_rows("doc1", "some text");

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Lecanemab");
        assert_eq!(entities[0].entity_type, "drug");
        assert_eq!(entities[0].id, "doc1");

        assert_eq!(relationships.len(), 1);
        let rel = &relationships[0];
        assert_eq!(rel.entity_name_1, "Lecanemab");
        assert_eq!(rel.entity_type_1, "drug");
        assert_eq!(rel.relationship, "is_target_of");
        assert_eq!(rel.entity_name_2, "Amyloid-β protofibrils");
        assert_eq!(rel.entity_type_2, "target");
    }

    #[test]
    fn test_missing_keys_default_empty() {
        let extraction: Extraction = serde_json::from_str("{}").unwrap();
        assert!(extraction.is_empty());

        let (entities, relationships) = extraction.into_rows("doc1", "text");
        assert!(entities.is_empty());
        assert!(relationships.is_empty());
    }

    #[test]
    fn test_short_tuples_dropped() {
        let extraction: Extraction = serde_json::from_str(
            r#"{"Entities": {}, "Relationships": [["a", "b", "c"]]}"#,
        )
        .unwrap();

        let (_, relationships) = extraction.into_rows("doc1", "text");
        assert!(relationships.is_empty());
    }
}
