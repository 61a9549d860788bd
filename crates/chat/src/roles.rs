//! Predefined system roles.

use serde::Serialize;

/// A named system role users can pick instead of typing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RolePreset {
    /// Short key used on the command line
    pub key: &'static str,
    /// Display label
    pub label: &'static str,
    /// System instruction sent to the model
    pub instruction: &'static str,
}

/// Built-in presets, in display order.
pub const ROLE_PRESETS: &[RolePreset] = &[
    RolePreset {
        key: "assistant",
        label: "Assistant",
        instruction: "You are a helpful assistant. You help the user to find the information they need.\n\
                      If the user types a question, you answer it.",
    },
    RolePreset {
        key: "translator",
        label: "Translator English-French",
        instruction: "You are an interpreter. You translate from English to French and from French to English.\n\
                      If the user types a French text, you translate it into English.\n\
                      If the user types an English text, you translate it into French.\n\
                      If the text contains only one to three words, give some examples of usage of these words in English.",
    },
    RolePreset {
        key: "guide",
        label: "Tour guide",
        instruction: "You are a travel guide. If the user types the name of a country or of a town,\n\
                      you tell them what the main places to visit in the country or the town are\n\
                      and the average price of a meal.",
    },
];

/// Find a preset by key or label, ignoring case.
pub fn find_preset(name: &str) -> Option<&'static RolePreset> {
    let name = name.trim();
    ROLE_PRESETS
        .iter()
        .find(|p| p.key.eq_ignore_ascii_case(name) || p.label.eq_ignore_ascii_case(name))
}

/// Resolve a role argument: a preset's instruction, or the text itself as a custom role.
pub fn resolve_role(value: &str) -> String {
    match find_preset(value) {
        Some(preset) => preset.instruction.to_string(),
        None => value.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_unique_keys() {
        let mut keys: Vec<&str> = ROLE_PRESETS.iter().map(|p| p.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), ROLE_PRESETS.len());
    }

    #[test]
    fn test_find_by_key_or_label() {
        assert_eq!(find_preset("translator").unwrap().label, "Translator English-French");
        assert_eq!(find_preset("Tour Guide").unwrap().key, "guide");
        assert!(find_preset("pirate").is_none());
    }

    #[test]
    fn test_resolve_role() {
        assert!(resolve_role("assistant").starts_with("You are a helpful assistant"));
        assert_eq!(resolve_role("  Answer like a pirate. "), "Answer like a pirate.");
    }
}
