//! Pending code-generation plan awaiting approval.

use std::collections::BTreeMap;

/// Proposed files waiting for "approve" or "cancel". At most one plan is
/// active; setting a new one replaces the old.
#[derive(Debug, Clone, Default)]
pub struct PendingPlan {
    files: BTreeMap<String, String>,
    active: bool,
}

impl PendingPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, files: BTreeMap<String, String>) {
        self.files = files;
        self.active = true;
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn files(&self) -> &BTreeMap<String, String> {
        &self.files
    }

    /// Proposed file names, one per line.
    pub fn summary(&self) -> String {
        self.files.keys().cloned().collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_summary_clear() {
        let mut plan = PendingPlan::new();
        assert!(!plan.is_active());

        plan.set(BTreeMap::from([
            ("src/main.rs".to_string(), "fn main() {}".to_string()),
            ("Cargo.toml".to_string(), "[package]".to_string()),
        ]));
        assert!(plan.is_active());
        assert_eq!(plan.summary(), "Cargo.toml\nsrc/main.rs");

        plan.clear();
        assert!(!plan.is_active());
        assert!(plan.files().is_empty());
    }
}
