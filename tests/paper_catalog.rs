//! Catalog policy and persistence behavior.

use folio::error::CatalogError;
use folio::paper::{CatalogLimits, PaperCatalog, PaperPreset};

fn custom_preset(name: &str) -> PaperPreset {
    PaperPreset {
        name: name.to_string(),
        width_mm: 110.0,
        height_mm: 220.0,
        description: "Sobre tamaño recetario".to_string(),
        protected: false,
    }
}

#[test]
fn builtin_presets_are_protected() {
    let catalog = PaperCatalog::with_builtin();
    assert!(!catalog.is_empty());
    for (_, preset) in catalog.iter() {
        assert!(preset.protected);
        assert!(preset.width_mm > 0.0);
        assert!(preset.height_mm > 0.0);
    }
    let carta = catalog.get("carta").expect("carta preset");
    assert_eq!(carta.width_mm, 216.0);
    assert_eq!(carta.height_mm, 279.0);
}

#[test]
fn protected_presets_reject_mutation_and_deletion() {
    let mut catalog = PaperCatalog::with_builtin();
    let err = catalog.upsert("a4", custom_preset("A4 falso")).expect_err("policy");
    assert!(matches!(err, CatalogError::ProtectedPreset { .. }));

    let err = catalog.remove("carta").expect_err("policy");
    assert!(matches!(err, CatalogError::ProtectedPreset { .. }));
    assert!(catalog.get("carta").is_some());
}

#[test]
fn custom_presets_can_be_managed() {
    let mut catalog = PaperCatalog::with_builtin();
    catalog
        .upsert("recetario", custom_preset("Recetario"))
        .expect("insert");
    assert_eq!(catalog.get("recetario").expect("preset").name, "Recetario");

    let mut updated = custom_preset("Recetario");
    updated.height_mm = 230.0;
    catalog.upsert("recetario", updated).expect("update");
    assert_eq!(catalog.get("recetario").expect("preset").height_mm, 230.0);

    catalog.remove("recetario").expect("remove");
    assert!(catalog.get("recetario").is_none());
}

#[test]
fn unknown_preset_removal_is_reported() {
    let mut catalog = PaperCatalog::with_builtin();
    let err = catalog.remove("no-existe").expect_err("unknown");
    assert!(matches!(err, CatalogError::UnknownPreset { .. }));
}

#[test]
fn catalog_limits_bound_growth() {
    let mut catalog = PaperCatalog::with_limits(CatalogLimits {
        max_presets: 1,
        ..CatalogLimits::default()
    });
    catalog.upsert("uno", custom_preset("Uno")).expect("insert");
    let err = catalog.upsert("dos", custom_preset("Dos")).expect_err("limit");
    assert!(matches!(err, CatalogError::LimitExceeded { .. }));
}

#[test]
fn json_round_trip_preserves_wire_keys() {
    let catalog = PaperCatalog::with_builtin();
    let json = catalog.to_json().expect("serialize");
    for key in ["\"nombre\"", "\"ancho\"", "\"alto\"", "\"descripcion\"", "\"protegido\""] {
        assert!(json.contains(key), "missing wire key {}", key);
    }

    let restored = PaperCatalog::from_json(&json).expect("deserialize");
    assert_eq!(restored.len(), catalog.len());
    assert_eq!(restored.get("a4"), catalog.get("a4"));
}

#[test]
fn malformed_json_surfaces_a_persistence_error() {
    let err = PaperCatalog::from_json("{not json").expect_err("persistence");
    assert!(matches!(err, CatalogError::Persistence { .. }));
}
