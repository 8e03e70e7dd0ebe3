use griddle_core::schema::{RecordDesc, Tables, Ty};

/// Schema:
///   BaseProfile { ID, Handle } with identity "profiles,alias:p"
///   AdminProfile { BaseProfile (embedded, inherit), Level }
#[test]
fn inherit_adopts_the_embedded_types_identity() {
    let tables = Tables::default();
    tables.register(
        RecordDesc::new("BaseProfile")
            .with_identity("profiles,alias:p")
            .field("ID", Ty::I64, "id,pk")
            .field("Handle", Ty::String, ""),
    );
    let key = tables.register(
        RecordDesc::new("AdminProfile")
            .embed("Base", Ty::strukt("BaseProfile"), ",inherit")
            .field("Level", Ty::I64, ""),
    );

    let table = tables.get(&key).unwrap();
    assert_eq!(table.type_name, "BaseProfile");
    assert_eq!(table.model_name, "base_profile");
    assert_eq!(table.sql_name.as_str(), "\"profiles\"");
    assert_eq!(table.sql_name_for_selects.as_str(), "\"profiles\"");
    assert_eq!(table.alias.as_str(), "\"p\"");

    // Fields come from both types; the embedded ones carry their path.
    assert_eq!(table.field("handle").unwrap().index, vec![0, 1]);
    assert_eq!(table.field("level").unwrap().index, vec![1]);
}

#[test]
fn plain_embedding_keeps_the_owners_identity() {
    let tables = Tables::default();
    tables.register(
        RecordDesc::new("Timestamps")
            .field("CreatedAt", Ty::Time, "")
            .field("UpdatedAt", Ty::NullTime, ""),
    );
    let key = tables.register(
        RecordDesc::new("Invoice")
            .field("ID", Ty::I64, "id,pk")
            .embed("Times", Ty::strukt("Timestamps"), ""),
    );

    let table = tables.get(&key).unwrap();
    assert_eq!(table.type_name, "Invoice");
    assert_eq!(table.name, "invoices");
    assert!(table.has_field("created_at"));
    assert!(table.has_field("updated_at"));
}
