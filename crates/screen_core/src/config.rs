use serde::{Deserialize, Serialize};

pub const DEFAULT_REST_VERSION: &str = "v2";

/// Base parameters of one entity screen. Populated once by the screen's
/// `required_init_parameters` step and never replaced afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenConfig {
    pub module_name: String,
    pub rest_entity_name: String,
    pub entity_name: String,
    pub cancel_page: String,
    pub rest_version: String,
}

impl ScreenConfig {
    pub fn new(
        module_name: impl Into<String>,
        rest_entity_name: impl Into<String>,
        entity_name: impl Into<String>,
        cancel_page: impl Into<String>,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            rest_entity_name: rest_entity_name.into(),
            entity_name: entity_name.into(),
            cancel_page: cancel_page.into(),
            rest_version: DEFAULT_REST_VERSION.to_string(),
        }
    }

    pub fn with_rest_version(mut self, rest_version: impl Into<String>) -> Self {
        self.rest_version = rest_version.into();
        self
    }

    /// First mandatory field that is empty, if any. `module_name` and
    /// `rest_entity_name` are required before any network wiring happens.
    pub fn missing_required(&self) -> Option<&'static str> {
        if self.module_name.is_empty() {
            return Some("module_name");
        }
        if self.rest_entity_name.is_empty() {
            return Some("rest_entity_name");
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_config_defaults_to_rest_version_v2() {
        let config = ScreenConfig::new("inventory", "department", "Department", "departments.page");
        assert_eq!(config.rest_version, "v2");
        assert!(config.missing_required().is_none());
    }

    #[test]
    fn missing_required_reports_first_empty_field() {
        let config = ScreenConfig::new("", "department", "Department", "departments.page");
        assert_eq!(config.missing_required(), Some("module_name"));

        let config = ScreenConfig::new("inventory", "", "Department", "departments.page");
        assert_eq!(config.missing_required(), Some("rest_entity_name"));
    }

    #[test]
    fn with_rest_version_overrides_the_default() {
        let config = ScreenConfig::new("inventory", "item", "Item", "items.page")
            .with_rest_version("v1");
        assert_eq!(config.rest_version, "v1");
    }
}
