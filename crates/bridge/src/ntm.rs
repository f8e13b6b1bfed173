use serde::{Deserialize, Serialize};

use crate::dis::EntityType;

/// One row of the network type map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NtmEntry {
    pub template: String,
    pub entity_type: EntityType,
}

impl NtmEntry {
    pub fn new(template: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            template: template.into(),
            entity_type,
        }
    }

    /// Number of specified fields matched, or `None` when a specified field
    /// differs. Zero fields after the kind act as wildcards.
    fn match_score(&self, incoming: &EntityType) -> Option<u32> {
        let e = &self.entity_type;
        if e.kind != incoming.kind {
            return None;
        }
        let fields = [
            (e.domain as u32, incoming.domain as u32),
            (e.country as u32, incoming.country as u32),
            (e.category as u32, incoming.category as u32),
            (e.subcategory as u32, incoming.subcategory as u32),
            (e.specific as u32, incoming.specific as u32),
            (e.extra as u32, incoming.extra as u32),
        ];
        let mut score = 1;
        for (wanted, got) in fields {
            if wanted == 0 {
                continue;
            }
            if wanted != got {
                return None;
            }
            score += 1;
        }
        Some(score)
    }
}

/// Network type mapper: player template <-> DIS entity type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ntm {
    entries: Vec<NtmEntry>,
}

impl Ntm {
    pub fn new(entries: Vec<NtmEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: NtmEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[NtmEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Template for an incoming entity type: the entry matching the most
    /// specified fields, first entry on ties.
    pub fn find_template(&self, incoming: &EntityType) -> Option<&str> {
        let mut best: Option<(u32, &NtmEntry)> = None;
        for entry in &self.entries {
            if let Some(score) = entry.match_score(incoming)
                && best.is_none_or(|(top, _)| score > top)
            {
                best = Some((score, entry));
            }
        }
        best.map(|(_, entry)| entry.template.as_str())
    }

    /// Entity type published for local players built from `template`.
    pub fn find_entity_type(&self, template: &str) -> Option<EntityType> {
        self.entries
            .iter()
            .find(|entry| entry.template == template)
            .map(|entry| entry.entity_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Ntm {
        Ntm::new(vec![
            NtmEntry::new("aircraft", EntityType::new(1, 2, 0, 0, 0, 0, 0)),
            NtmEntry::new("fighter", EntityType::new(1, 2, 225, 1, 0, 0, 0)),
            NtmEntry::new("f16", EntityType::new(1, 2, 225, 1, 3, 0, 0)),
            NtmEntry::new("f16c", EntityType::new(1, 2, 225, 1, 3, 3, 0)),
            NtmEntry::new("fighter_dup", EntityType::new(1, 2, 225, 1, 0, 0, 0)),
            NtmEntry::new("aim120", EntityType::new(2, 9, 225, 1, 1, 0, 0)),
        ])
    }

    #[test]
    fn test_exact_match_wins() {
        let ntm = table();
        assert_eq!(ntm.find_template(&EntityType::new(1, 2, 225, 1, 3, 3, 0)), Some("f16c"));
    }

    #[test]
    fn test_best_wildcard_match() {
        let ntm = table();
        assert_eq!(ntm.find_template(&EntityType::new(1, 2, 225, 1, 3, 9, 1)), Some("f16"));
        assert_eq!(ntm.find_template(&EntityType::new(1, 2, 225, 1, 7, 0, 0)), Some("fighter"));
        assert_eq!(ntm.find_template(&EntityType::new(1, 2, 222, 4, 0, 0, 0)), Some("aircraft"));
    }

    #[test]
    fn test_kind_must_match() {
        let ntm = table();
        assert_eq!(ntm.find_template(&EntityType::new(3, 1, 225, 0, 0, 0, 0)), None);
    }

    #[test]
    fn test_output_lookup() {
        let ntm = table();
        assert_eq!(ntm.find_entity_type("aim120"), Some(EntityType::new(2, 9, 225, 1, 1, 0, 0)));
        assert_eq!(ntm.find_entity_type("unknown"), None);
    }

    #[test]
    fn test_load_from_json() {
        let json = r#"[
            { "template": "t72", "entity_type": { "kind": 1, "domain": 1, "country": 222,
              "category": 1, "subcategory": 2, "specific": 0, "extra": 0 } }
        ]"#;
        let ntm: Ntm = serde_json::from_str(json).unwrap();
        assert_eq!(ntm.len(), 1);
        assert_eq!(ntm.find_template(&EntityType::new(1, 1, 222, 1, 2, 1, 0)), Some("t72"));
    }
}
