//! Binding configuration: which attributes carry names, kinds and markers.

/// Attribute and field names the binding layer looks at.
///
/// One config is owned by each [`Document`](crate::document::Document) and
/// shared by all of its views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    /// Naming attributes, checked in order; the first one present wins.
    pub name_attributes: Vec<String>,
    /// Attribute overriding the node kind used for adapter lookup.
    pub type_attribute: String,
    /// Attribute marking a node as display-only (skipped on read).
    pub readonly_attribute: String,
    /// Attribute selecting markup (`html`) instead of text for editable reads.
    pub format_attribute: String,
    /// Record field holding a list item's key.
    pub key_field: String,
    /// Class applied by [`View::mark`](crate::view::View::mark).
    pub mark_class: String,
    /// Class prefix given to template instances without `data-class`.
    pub template_class_prefix: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            name_attributes: vec!["name".to_owned(), "data-name".to_owned()],
            type_attribute: "data-type".to_owned(),
            readonly_attribute: "data-readonly".to_owned(),
            format_attribute: "data-format".to_owned(),
            key_field: "_id".to_owned(),
            mark_class: "mark".to_owned(),
            template_class_prefix: "templ_".to_owned(),
        }
    }
}

impl BindingConfig {
    /// Create a new default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the naming attributes (builder).
    pub fn with_name_attributes(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.name_attributes = names.into_iter().map(Into::into).collect();
        self
    }

    /// Set the kind override attribute (builder).
    pub fn with_type_attribute(mut self, name: impl Into<String>) -> Self {
        self.type_attribute = name.into();
        self
    }

    /// Set the read-only marker attribute (builder).
    pub fn with_readonly_attribute(mut self, name: impl Into<String>) -> Self {
        self.readonly_attribute = name.into();
        self
    }

    /// Set the list item key field (builder).
    pub fn with_key_field(mut self, name: impl Into<String>) -> Self {
        self.key_field = name.into();
        self
    }

    /// Set the mark class (builder).
    pub fn with_mark_class(mut self, class: impl Into<String>) -> Self {
        self.mark_class = class.into();
        self
    }

    /// Naming attributes as string slices.
    pub(crate) fn name_attribute_refs(&self) -> Vec<&str> {
        self.name_attributes.iter().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = BindingConfig::new();
        assert_eq!(config.name_attributes, vec!["name", "data-name"]);
        assert_eq!(config.type_attribute, "data-type");
        assert_eq!(config.key_field, "_id");
        assert_eq!(config.mark_class, "mark");
    }

    #[test]
    fn builders() {
        let config = BindingConfig::new()
            .with_name_attributes(["bind"])
            .with_key_field("id")
            .with_mark_class("error")
            .with_type_attribute("kind")
            .with_readonly_attribute("ro");
        assert_eq!(config.name_attribute_refs(), vec!["bind"]);
        assert_eq!(config.key_field, "id");
        assert_eq!(config.mark_class, "error");
        assert_eq!(config.type_attribute, "kind");
        assert_eq!(config.readonly_attribute, "ro");
    }
}
