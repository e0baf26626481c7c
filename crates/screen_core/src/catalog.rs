use std::collections::HashMap;

/// Localized message lookup used when assembling screen labels. Missing keys
/// fall back to the key itself so a screen never renders an empty label.
pub trait MessageCatalog: Send + Sync {
    fn resolve(&self, key: &str) -> String;

    /// Substitutes positional `{0}`, `{1}`, ... placeholders.
    fn format(&self, template: &str, args: &[&str]) -> String {
        let mut out = template.to_string();
        for (index, arg) in args.iter().enumerate() {
            out = out.replace(&format!("{{{index}}}"), arg);
        }
        out
    }
}

/// In-memory catalog. Serves as the built-in English fallback and as the
/// test double for screens that extend the base key set.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    messages: HashMap<String, String>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// English defaults for every key the base controller resolves.
    pub fn builtin_en() -> Self {
        let mut catalog = Self::new();
        for (key, text) in [
            ("general.name", "Name"),
            ("general.description", "Description"),
            ("general.cancel", "Cancel"),
            ("general.save", "Save"),
            ("general.update", "Update"),
            ("general.purge", "Purge"),
            ("general.edit", "Edit"),
            ("general.retireReason", "Retire reason"),
            ("entity.retired.reason", "Reason for retiring"),
            ("entity.name.required", "Name is required"),
            ("entity.delete", "Permanently delete this {0}"),
            ("entity.new", "New {0}"),
            ("entity.retire", "Retire {0}"),
            ("entity.unretire", "Unretire {0}"),
            ("entity.error.notFound", "The {0} could not be found"),
        ] {
            catalog.insert(key, text);
        }
        catalog
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.messages.insert(key.into(), text.into());
    }

    pub fn with_message(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(key, text);
        self
    }
}

impl MessageCatalog for StaticCatalog {
    fn resolve(&self, key: &str) -> String {
        self.messages
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }
}
