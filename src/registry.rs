//! Content-type registry — typed schemas for component property bags.
//!
//! DESIGN
//! ======
//! Components keep their properties as a JSON object on the wire. The
//! registry maps a content-type tag to its metadata and a per-property
//! schema, so callers can instantiate a component with defaults and check
//! a property bag before placing it on a page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::grid::{Component, Properties};

pub const HERO_BANNER: &str = "heroBanner";
pub const PRODUCT_SLIDER: &str = "productSlider";
pub const RICH_TEXT: &str = "richText";

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown content type: {0}")]
    UnknownType(String),
    #[error("missing required property `{property}` on {content_type}")]
    MissingRequired { content_type: String, property: String },
    #[error("property `{property}` on {content_type} expected {expected}")]
    KindMismatch { content_type: String, property: String, expected: &'static str },
}

// =============================================================================
// SCHEMA
// =============================================================================

/// Value kind a property must hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Number,
    Boolean,
    Array,
    /// A file reference stored as a URL string.
    File {
        #[serde(default)]
        extensions: Vec<String>,
    },
}

impl PropertyKind {
    fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::File { .. } => "file",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String | Self::File { .. } => value.is_string(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    #[serde(flatten)]
    pub kind: PropertyKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default)]
    pub required: bool,
}

impl PropertySchema {
    fn new(kind: PropertyKind, label: &str, default_value: Option<Value>, required: bool) -> Self {
        Self { kind, label: label.to_owned(), default_value, required }
    }
}

/// Registered content type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentTypeMeta {
    #[serde(rename = "type")]
    pub content_type: String,
    pub name: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub is_built_in: bool,
    #[serde(default)]
    pub default_properties: Properties,
    #[serde(default)]
    pub property_schema: HashMap<String, PropertySchema>,
}

// =============================================================================
// REGISTRY
// =============================================================================

#[derive(Debug, Clone, Default)]
pub struct ContentTypeRegistry {
    types: HashMap<String, ContentTypeMeta>,
}

impl ContentTypeRegistry {
    /// Empty registry with no types.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in hero banner, product slider, and
    /// rich text types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for meta in builtin_types() {
            registry.register(meta);
        }
        registry
    }

    /// Register or replace a content type by its tag.
    pub fn register(&mut self, meta: ContentTypeMeta) {
        self.types.insert(meta.content_type.clone(), meta);
    }

    #[must_use]
    pub fn get(&self, content_type: &str) -> Option<&ContentTypeMeta> {
        self.types.get(content_type)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Build a new component of `content_type` with its default properties.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType` if the tag is not registered.
    pub fn instantiate(&self, content_type: &str) -> Result<Component, RegistryError> {
        let meta = self
            .get(content_type)
            .ok_or_else(|| RegistryError::UnknownType(content_type.to_owned()))?;
        Ok(Component::new(content_type, meta.default_properties.clone()))
    }

    /// Check a component's properties against its type's schema.
    ///
    /// Properties not named in the schema are allowed through.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType`, `MissingRequired`, or `KindMismatch`.
    pub fn validate(&self, component: &Component) -> Result<(), RegistryError> {
        let meta = self
            .get(&component.content_type)
            .ok_or_else(|| RegistryError::UnknownType(component.content_type.clone()))?;

        for (property, schema) in &meta.property_schema {
            match component.properties.get(property) {
                None | Some(Value::Null) => {
                    if schema.required {
                        return Err(RegistryError::MissingRequired {
                            content_type: component.content_type.clone(),
                            property: property.clone(),
                        });
                    }
                }
                Some(value) if !schema.kind.accepts(value) => {
                    return Err(RegistryError::KindMismatch {
                        content_type: component.content_type.clone(),
                        property: property.clone(),
                        expected: schema.kind.name(),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

// =============================================================================
// BUILT-INS
// =============================================================================

fn props(value: Value) -> Properties {
    match value {
        Value::Object(map) => map,
        _ => Properties::new(),
    }
}

fn builtin_types() -> Vec<ContentTypeMeta> {
    let hero = ContentTypeMeta {
        content_type: HERO_BANNER.to_owned(),
        name: "Hero Banner".to_owned(),
        icon: "🖼️".to_owned(),
        is_built_in: true,
        default_properties: props(json!({
            "title": "Hero Title",
            "subtitle": "Hero Subtitle",
            "imageUrl": "",
            "ctaText": "Learn More",
            "ctaUrl": "#",
        })),
        property_schema: HashMap::from([
            ("title".to_owned(), PropertySchema::new(PropertyKind::String, "Title", Some(json!("Hero Title")), true)),
            (
                "subtitle".to_owned(),
                PropertySchema::new(PropertyKind::String, "Subtitle", Some(json!("Hero Subtitle")), false),
            ),
            (
                "imageUrl".to_owned(),
                PropertySchema::new(
                    PropertyKind::File { extensions: vec!["jpg".into(), "jpeg".into(), "png".into()] },
                    "Image URL",
                    None,
                    false,
                ),
            ),
            ("ctaText".to_owned(), PropertySchema::new(PropertyKind::String, "CTA Text", Some(json!("Learn More")), false)),
            ("ctaUrl".to_owned(), PropertySchema::new(PropertyKind::String, "CTA URL", Some(json!("#")), false)),
        ]),
    };

    let slider = ContentTypeMeta {
        content_type: PRODUCT_SLIDER.to_owned(),
        name: "Product Slider".to_owned(),
        icon: "🛒".to_owned(),
        is_built_in: true,
        default_properties: props(json!({
            "title": "Featured Products",
            "skus": [],
            "autoplay": true,
            "slidesToShow": 4,
        })),
        property_schema: HashMap::from([
            (
                "title".to_owned(),
                PropertySchema::new(PropertyKind::String, "Title", Some(json!("Featured Products")), true),
            ),
            ("skus".to_owned(), PropertySchema::new(PropertyKind::Array, "Product SKUs", Some(json!([])), false)),
            ("autoplay".to_owned(), PropertySchema::new(PropertyKind::Boolean, "Autoplay", Some(json!(true)), false)),
            (
                "slidesToShow".to_owned(),
                PropertySchema::new(PropertyKind::Number, "Slides to Show", Some(json!(4)), false),
            ),
        ]),
    };

    let rich_text = ContentTypeMeta {
        content_type: RICH_TEXT.to_owned(),
        name: "Rich Text Editor".to_owned(),
        icon: "📝".to_owned(),
        is_built_in: true,
        default_properties: props(json!({ "content": "<p>Enter your content here...</p>" })),
        property_schema: HashMap::from([(
            "content".to_owned(),
            PropertySchema::new(PropertyKind::String, "Content", Some(json!("<p>Enter your content here...</p>")), true),
        )]),
    };

    vec![hero, slider, rich_text]
}

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;
