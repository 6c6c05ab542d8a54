use dashmap::DashMap;
use extract::ChatOutcome;
use sha2::{Digest, Sha256};

/// Dedup cache for model responses, keyed by a hash of the document text.
/// Literature dumps routinely contain duplicate abstracts; a hit saves a
/// full chat-completion round trip.
pub struct ResponseCache {
    responses: DashMap<String, (String, Option<String>)>,
    max_entries: usize,
}

impl ResponseCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            responses: DashMap::new(),
            max_entries,
        }
    }

    pub fn get(&self, content: &str) -> Option<ChatOutcome> {
        let key = hash_text(content);
        self.responses.get(&key).map(|r| ChatOutcome {
            content: r.value().0.clone(),
            reasoning: r.value().1.clone(),
        })
    }

    pub fn put(&self, content: &str, outcome: &ChatOutcome) {
        if self.responses.len() >= self.max_entries {
            // Simple eviction: clear 25% (at least one entry) when full
            let to_remove: Vec<_> = self
                .responses
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.responses.remove(&key);
            }
        }
        let key = hash_text(content);
        self.responses
            .insert(key, (outcome.content.clone(), outcome.reasoning.clone()));
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }
}

fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let cache = ResponseCache::new(16);
        assert!(cache.get("some abstract").is_none());

        cache.put(
            "some abstract",
            &ChatOutcome {
                content: "{}".to_string(),
                reasoning: Some("trace".to_string()),
            },
        );

        let hit = cache.get("some abstract").unwrap();
        assert_eq!(hit.content, "{}");
        assert_eq!(hit.reasoning.as_deref(), Some("trace"));
        assert!(cache.get("other abstract").is_none());
    }

    #[test]
    fn test_eviction_keeps_cache_bounded() {
        let cache = ResponseCache::new(8);
        for i in 0..50 {
            cache.put(
                &format!("doc {i}"),
                &ChatOutcome {
                    content: String::new(),
                    reasoning: None,
                },
            );
        }
        assert!(cache.len() <= 8);
    }

    #[test]
    fn test_tiny_cache_still_evicts() {
        let cache = ResponseCache::new(2);
        for i in 0..10 {
            cache.put(
                &format!("doc {i}"),
                &ChatOutcome {
                    content: String::new(),
                    reasoning: None,
                },
            );
        }
        assert!(cache.len() <= 2);
    }
}
