use std::collections::HashSet;

/// Hands out table aliases that are unique within one statement.
///
/// A preferred name is used as-is the first time; later requests for the same
/// name get `_2`, `_3`, ... appended.
#[derive(Debug, Default)]
pub struct AliasRegistry {
    taken: HashSet<String>,
}

impl AliasRegistry {
    /// Registry with the root alias already reserved.
    pub fn with_base(base_alias: &str) -> Self {
        let mut registry = AliasRegistry::default();
        registry.taken.insert(base_alias.to_string());
        registry
    }

    pub fn assign(&mut self, preferred: &str) -> String {
        let mut candidate = preferred.to_string();
        let mut suffix = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}_{}", preferred, suffix);
            suffix += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
