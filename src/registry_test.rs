use super::*;

#[test]
fn builtins_are_registered() {
    let registry = ContentTypeRegistry::with_builtins();
    assert_eq!(registry.len(), 3);
    for tag in [HERO_BANNER, PRODUCT_SLIDER, RICH_TEXT] {
        let meta = registry.get(tag).unwrap();
        assert!(meta.is_built_in);
        assert_eq!(meta.content_type, tag);
    }
    assert!(ContentTypeRegistry::new().is_empty());
}

#[test]
fn instantiate_copies_defaults_with_fresh_id() {
    let registry = ContentTypeRegistry::with_builtins();
    let a = registry.instantiate(PRODUCT_SLIDER).unwrap();
    let b = registry.instantiate(PRODUCT_SLIDER).unwrap();
    assert_ne!(a.id, b.id);
    assert_eq!(a.content_type, PRODUCT_SLIDER);
    assert_eq!(a.properties.get("slidesToShow"), Some(&json!(4)));
    assert_eq!(a.properties.get("autoplay"), Some(&json!(true)));
    registry.validate(&a).unwrap();
}

#[test]
fn instantiate_unknown_type_errors() {
    let registry = ContentTypeRegistry::with_builtins();
    let err = registry.instantiate("carousel").unwrap_err();
    assert!(matches!(err, RegistryError::UnknownType(ref t) if t == "carousel"));
}

#[test]
fn validate_rejects_missing_required() {
    let registry = ContentTypeRegistry::with_builtins();
    let mut comp = registry.instantiate(HERO_BANNER).unwrap();
    comp.properties.remove("title");
    let err = registry.validate(&comp).unwrap_err();
    assert!(matches!(err, RegistryError::MissingRequired { ref property, .. } if property == "title"));

    comp.properties.insert("title".into(), Value::Null);
    assert!(registry.validate(&comp).is_err());
}

#[test]
fn validate_rejects_kind_mismatch() {
    let registry = ContentTypeRegistry::with_builtins();
    let mut comp = registry.instantiate(PRODUCT_SLIDER).unwrap();
    comp.properties
        .insert("slidesToShow".into(), json!("four"));
    let err = registry.validate(&comp).unwrap_err();
    assert!(err.to_string().contains("expected number"));
}

#[test]
fn validate_allows_optional_absent_and_extra_properties() {
    let registry = ContentTypeRegistry::with_builtins();
    let mut comp = registry.instantiate(HERO_BANNER).unwrap();
    comp.properties.remove("subtitle");
    comp.properties.insert("trackingId".into(), json!(17));
    registry.validate(&comp).unwrap();
}

#[test]
fn register_custom_type_from_json() {
    let raw = json!({
        "type": "quote",
        "name": "Quote",
        "defaultProperties": { "text": "" },
        "propertySchema": {
            "text": { "type": "string", "label": "Text", "required": true },
            "image": { "type": "file", "label": "Image", "extensions": ["png"] }
        }
    });
    let meta: ContentTypeMeta = serde_json::from_value(raw).unwrap();
    assert_eq!(
        meta.property_schema["image"].kind,
        PropertyKind::File { extensions: vec!["png".into()] }
    );

    let mut registry = ContentTypeRegistry::new();
    registry.register(meta);
    let comp = registry.instantiate("quote").unwrap();
    registry.validate(&comp).unwrap();
}
