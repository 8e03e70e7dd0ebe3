use griddle_core::schema::{RecordDesc, RelationKind, Tables, Ty};

fn author_desc() -> RecordDesc {
    RecordDesc::new("Author")
        .field("ID", Ty::I64, "id,pk")
        .field("Name", Ty::String, "")
}

#[test]
fn foreign_key_is_found_by_attribute_prefix() {
    let tables = Tables::default();
    tables.register(author_desc());
    let key = tables.register(
        RecordDesc::new("Book")
            .field("ID", Ty::I64, "id,pk")
            .field("AuthorID", Ty::I64, "")
            .field("Author", Ty::option(Ty::strukt("Author")), "rel:has-one"),
    );

    let book = tables.get(&key).unwrap();
    let rel = book.relation("Author").unwrap();
    assert_eq!(rel.kind, RelationKind::HasOne);
    assert_eq!(rel.join_table.type_name, "Author");
    assert_eq!(rel.base_fields.len(), 1);
    assert_eq!(rel.base_fields[0].name, "author_id");
    assert_eq!(rel.join_fields[0].name, "id");

    // The relation field leaves the column list but stays addressable.
    assert!(book.fields().iter().all(|f| f.name != "author"));
    assert!(book.has_field("author"));
}

#[test]
fn foreign_key_falls_back_to_the_bare_key_name() {
    let tables = Tables::default();
    tables.register(author_desc());
    let key = tables.register(
        RecordDesc::new("Draft")
            .field("ID", Ty::I64, "id,pk")
            .field("Writer", Ty::option(Ty::strukt("Author")), "rel:has-one"),
    );

    // No writer_id column; the join pk's own name matches a base column.
    let draft = tables.get(&key).unwrap();
    let rel = draft.relation("Writer").unwrap();
    assert_eq!(rel.base_fields[0].name, "id");
}

#[test]
fn explicit_join_pairs_override_the_convention() {
    let tables = Tables::default();
    tables.register(author_desc());
    let key = tables.register(
        RecordDesc::new("Memo")
            .field("ID", Ty::I64, "id,pk")
            .field("WrittenBy", Ty::I64, "")
            .field(
                "Author",
                Ty::option(Ty::strukt("Author")),
                "rel:has-one,join:written_by=id",
            ),
    );

    let memo = tables.get(&key).unwrap();
    let rel = memo.relation("Author").unwrap();
    assert_eq!(rel.base_fields[0].name, "written_by");
    assert_eq!(rel.join_fields[0].name, "id");
}

#[test]
fn unresolvable_foreign_key_is_a_schema_error() {
    let tables = Tables::default();
    tables.register(author_desc());
    let key = tables.register(
        RecordDesc::new("Review")
            .field("ID", Ty::I64, "review_id,pk")
            .field("Author", Ty::option(Ty::strukt("Author")), "rel:has-one"),
    );

    let err = tables.get(&key).unwrap_err();
    assert!(err.is_invalid_schema());
    let msg = err.to_string();
    assert!(msg.contains("Review has-one Author"), "{msg}");
    assert!(msg.contains("must have column author_id"), "{msg}");
    assert!(msg.contains("to override"), "{msg}");
}

#[test]
fn join_side_lookup_failures_name_the_join_table() {
    let tables = Tables::default();
    tables.register(author_desc());
    let key = tables.register(
        RecordDesc::new("Letter")
            .field("ID", Ty::I64, "id,pk")
            .field(
                "Author",
                Ty::option(Ty::strukt("Author")),
                "rel:has-one,join:id=missing",
            ),
    );

    let err = tables.get(&key).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("Author must have column missing"), "{msg}");
}

#[test]
fn keyless_join_table_is_rejected() {
    let tables = Tables::default();
    tables.register(RecordDesc::new("Blob").field("Data", Ty::Bytes, ""));
    let key = tables.register(
        RecordDesc::new("Upload")
            .field("ID", Ty::I64, "id,pk")
            .field("Blob", Ty::option(Ty::strukt("Blob")), "rel:has-one"),
    );

    let err = tables.get(&key).unwrap_err();
    assert!(err.is_invalid_schema());
    assert!(err.to_string().contains("does not have primary keys"));
}

#[test]
fn unknown_relation_kinds_are_rejected() {
    let tables = Tables::default();
    tables.register(author_desc());
    let key = tables.register(
        RecordDesc::new("Pet")
            .field("ID", Ty::I64, "id,pk")
            .field("Author", Ty::option(Ty::strukt("Author")), "rel:owns"),
    );

    let err = tables.get(&key).unwrap_err();
    assert!(err.is_invalid_schema());
    assert!(err.to_string().contains("unknown relation=owns"));
}
