/// Fixed vocabulary of biomedical entity categories.
pub const ENTITY_TYPES: [&str; 11] = [
    "anatomy",
    "biomarker",
    "complication",
    "disease",
    "drug",
    "gene",
    "side effect",
    "symptom",
    "target",
    "test",
    "treatment",
];

/// Fixed vocabulary of relation kinds.
pub const RELATION_TYPES: [&str; 9] = [
    "complication_of",
    "increases_expression_of",
    "is_biomarker_of",
    "is_located_in",
    "is_side_effect_of",
    "is_symptom_of",
    "is_target_of",
    "treat",
    "is_examination_for",
];

pub fn build_extraction_prompt(document_text: &str) -> String {
    format!(
        r#"You are a biomedical knowledge graph construction assistant. Perform document analysis and relationship extraction following these strict protocols:

# Processing Workflow
1. Identify candidate entities and contextual relationships, then map findings to the predefined schema below.

2. **Entity Recognition**
   Types with definitions:
   1). anatomy: structures or functional parts of the body systems (organs, tissues, cellular components). Excludes pathological states. Example: liver, hippocampus.
   2). biomarker: a measurable biological indicator used to assess physiological or pathological states, acting as an indirect indicator rather than a drug target. Example: hemoglobin A1c, C-reactive protein.
   3). complication: a secondary condition arising as a direct consequence of a primary disease or intervention. Must involve causality. Example: diabetic neuropathy in diabetes mellitus.
   4). disease: a specific pathological disorder with characteristic signs and symptoms. Example: Alzheimer's disease, rheumatoid arthritis.
   5). drug: a chemical substance with therapeutic or diagnostic properties, including generic and brand names. Excludes non-pharmacological interventions. Example: aspirin, Bevacizumab.
   6). gene: a functional unit of heredity represented by standardized symbols, distinct from gene products classified under target. Example: BRCA1, TP53.
   7). side effect: an unintended physiological response directly linked to the pharmacological action of a drug at normal doses. Example: nausea caused by chemotherapy.
   8). symptom: a patient-perceived subjective manifestation of a disease, independent of drug exposure. Example: fatigue, chest pain.
   9). target: a molecular entity (protein, enzyme, receptor) directly modulated by a drug to exert therapeutic effects. Example: ACE2 receptor.
   10). test: a diagnostic procedure or assay to detect or measure biological markers or disease states, excluding the biomarkers themselves. Example: MRI scan, ELISA assay.
   11). treatment: a clinical intervention intended to prevent or manage diseases, including non-pharmacological approaches. Broader scope than drug. Example: radiotherapy.

   Annotation principles:
   (1) Non-overlapping: single text span maps to a single entity type
   (2) Non-nesting: no embedded entities within spans
   (3) Minimal punctuation: exclude non-essential conjunctions and punctuation

3. **Relation Extraction**
   Relationship definitions:
   1). complication_of | complication <-> disease: the complication directly arises from the primary disease or its treatment.
   2). increases_expression_of | drug <-> gene: the drug enhances transcription or translation activity of the gene.
   3). is_biomarker_of | biomarker <-> disease: the biomarker indicates presence, severity, or progression of the disease.
   4). is_located_in | disease <-> anatomy: the disease primarily manifests in or affects the anatomical structure.
   5). is_side_effect_of | side effect <-> drug: the reaction is directly attributable to the drug at therapeutic doses.
   6). is_symptom_of | symptom <-> disease: the manifestation arises from the disease's pathophysiology.
   7). is_target_of | target <-> drug: the biomolecule directly interacts with the drug to mediate its effect.
   8). treat | drug <-> disease: the drug is clinically used to alleviate, manage, or cure the disease.
   9). is_examination_for | test <-> disease: the procedure is used to confirm, stage, or track the disease.

   Annotation principles:
   (1) Intra-sentence priority: prefer relations within single sentences
   (2) Unidirectionality: maintain only one directional relation per entity pair
   (3) Schema compliance: use only predefined relationship types

# Output Specifications
- Strict JSON format with two root keys: Entities, Relationships
- Entity preservation: maintain original text case and formatting
- Relationship format: [source_entity, source_type, relationship, target_entity, target_type]
- Make sure every entity and relationship comes from the input text
- No null/empty values or placeholder text
- No explanatory content

# Input Text
{document_text}

# Output Example
{{
    "Entities": {{
        "Alzheimer's disease": "disease",
        "Lecanemab": "drug",
        "Cognitive decline": "symptom",
        "Amyloid-β protofibrils": "target",
        "PET scan": "test"
    }},
    "Relationships": [
        ["Lecanemab", "drug", "treat", "Alzheimer's disease", "disease"],
        ["Cognitive decline", "symptom", "is_symptom_of", "Alzheimer's disease", "disease"],
        ["Amyloid-β protofibrils", "target", "is_target_of", "Lecanemab", "drug"],
        ["PET scan", "test", "is_examination_for", "Alzheimer's disease", "disease"]
    ]
}}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_document() {
        let prompt = build_extraction_prompt("Aspirin treats headaches.");
        assert!(prompt.contains("Aspirin treats headaches."));
        for entity_type in ENTITY_TYPES {
            assert!(prompt.contains(entity_type), "missing {entity_type}");
        }
        for relation in RELATION_TYPES {
            assert!(prompt.contains(relation), "missing {relation}");
        }
    }
}
