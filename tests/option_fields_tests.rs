use artfolio_backend::entities::{
    image::{MetadataChanges, UpdateImageRequest},
    option_fields::PatchField,
};
use serde_json::json;

fn changes(body: serde_json::Value) -> MetadataChanges {
    let request: UpdateImageRequest = serde_json::from_value(body).unwrap();
    MetadataChanges::from(request)
}

#[test]
fn absent_null_and_value_map_to_three_states() {
    let request: UpdateImageRequest =
        serde_json::from_value(json!({ "customName": "Dune", "price": null })).unwrap();

    assert_eq!(request.custom_name, PatchField::Set("Dune".to_string()));
    assert_eq!(request.price, PatchField::Clear);
    assert_eq!(request.description, PatchField::Unchanged);
}

#[test]
fn blank_text_clears_and_values_are_trimmed() {
    let changes = changes(json!({ "customName": "  Dune  ", "description": " \t " }));

    assert_eq!(changes.custom_name, PatchField::Set("Dune".to_string()));
    assert!(changes.description.is_clear());
    assert!(changes.price.is_unchanged());
}

#[test]
fn empty_body_changes_nothing() {
    assert!(changes(json!({})).is_empty());
    assert!(!changes(json!({ "price": null })).is_empty());
}

#[test]
fn apply_to_leaves_unchanged_fields_alone() {
    let mut target = Some("old".to_string());

    PatchField::<String>::Unchanged.apply_to(&mut target);
    assert_eq!(target.as_deref(), Some("old"));

    PatchField::Set("new".to_string()).apply_to(&mut target);
    assert_eq!(target.as_deref(), Some("new"));

    PatchField::<String>::Clear.apply_to(&mut target);
    assert_eq!(target, None);
}

#[test]
fn nested_option_conversion() {
    assert!(PatchField::<i32>::from(None).is_unchanged());
    assert!(PatchField::<i32>::from(Some(None)).is_clear());
    assert_eq!(PatchField::from(Some(Some(3))).value_ref(), Some(&3));
    assert_eq!(PatchField::Set("x".to_string()).as_str_option(), Some(Some("x")));
}
