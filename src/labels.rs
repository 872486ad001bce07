//! Layout id to two-letter language code.

use crate::platform::LayoutId;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Primary language ids (low 10 bits of a LANGID) to ISO 639-1 codes.
static PRIMARY_LANGUAGES: Lazy<HashMap<u16, &'static str>> = Lazy::new(|| {
    [
        (0x01, "AR"),
        (0x02, "BG"),
        (0x04, "ZH"),
        (0x05, "CS"),
        (0x06, "DA"),
        (0x07, "DE"),
        (0x08, "EL"),
        (0x09, "EN"),
        (0x0A, "ES"),
        (0x0B, "FI"),
        (0x0C, "FR"),
        (0x0D, "HE"),
        (0x0E, "HU"),
        (0x10, "IT"),
        (0x11, "JA"),
        (0x12, "KO"),
        (0x13, "NL"),
        (0x14, "NO"),
        (0x15, "PL"),
        (0x16, "PT"),
        (0x18, "RO"),
        (0x19, "RU"),
        (0x1A, "HR"),
        (0x1B, "SK"),
        (0x1D, "SV"),
        (0x1E, "TH"),
        (0x1F, "TR"),
        (0x22, "UK"),
        (0x23, "BE"),
        (0x24, "SL"),
        (0x25, "ET"),
        (0x26, "LV"),
        (0x27, "LT"),
        (0x2A, "VI"),
        (0x37, "KA"),
        (0x39, "HI"),
        (0x3F, "KK"),
    ]
    .into_iter()
    .collect()
});

/// Resolves and caches two-letter codes for layouts.
#[derive(Default)]
pub struct LanguageLabelMap {
    cache: HashMap<LayoutId, String>,
}

impl LanguageLabelMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-letter uppercase code, e.g. "EN".
    pub fn label(&mut self, id: LayoutId) -> String {
        if let Some(label) = self.cache.get(&id) {
            return label.clone();
        }
        let label = resolve(id);
        self.cache.insert(id, label.clone());
        label
    }
}

fn resolve(id: LayoutId) -> String {
    if id.is_unknown() {
        return "??".to_string();
    }
    let lang_id = id.language_id();

    #[cfg(windows)]
    if let Some(code) = crate::platform::windows::iso_language_name(lang_id) {
        return code;
    }

    match PRIMARY_LANGUAGES.get(&(lang_id & 0x3FF)) {
        Some(code) => code.to_string(),
        None => format!("{:X}", lang_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn maps_primary_language() {
        let mut labels = LanguageLabelMap::new();
        // en-US, en-GB, ru-RU, uk-UA
        assert_eq!(labels.label(LayoutId::new(0x0409_0409)), "EN");
        assert_eq!(labels.label(LayoutId::new(0x0809_0809)), "EN");
        assert_eq!(labels.label(LayoutId::new(0x0419_0419)), "RU");
        assert_eq!(labels.label(LayoutId::new(0xF022_0422)), "UK");
    }

    #[cfg(not(windows))]
    #[test]
    fn unmapped_language_falls_back_to_hex() {
        let mut labels = LanguageLabelMap::new();
        assert_eq!(labels.label(LayoutId::new(0x0000_0477)), "477");
    }

    #[test]
    fn unknown_layout_has_placeholder() {
        let mut labels = LanguageLabelMap::new();
        assert_eq!(labels.label(LayoutId::UNKNOWN), "??");
    }

    #[test]
    fn labels_are_two_letters_for_common_layouts() {
        let mut labels = LanguageLabelMap::new();
        for raw in [0x0409_0409u64, 0x0407_0407, 0x040C_040C, 0x0411_0411] {
            let label = labels.label(LayoutId::new(raw));
            assert_eq!(label.len(), 2, "{label}");
            assert_eq!(label, label.to_uppercase());
        }
    }
}
