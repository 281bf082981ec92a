//! The catalog file in the repository matches the built-in catalog

use composer_schema::TypeCatalog;

const SHIPPED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../catalog/contract_types.yaml");

#[test]
fn shipped_catalog_matches_builtin() {
    let shipped = TypeCatalog::load(SHIPPED).unwrap();
    let builtin = TypeCatalog::builtin();

    assert_eq!(shipped.ids(), builtin.ids());
    for definition in builtin.iter() {
        assert_eq!(shipped.lookup(&definition.id).unwrap(), *definition);
    }
}
