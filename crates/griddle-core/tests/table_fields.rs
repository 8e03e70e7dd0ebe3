use griddle_core::schema::{RecordDesc, Tables, Ty};
use pretty_assertions::assert_eq;

/// Schema:
///   Reading { ID, Temp: Measure (embedded), Note (alias: comment), Raw (skipped) }
///   Measure { Value, Unit }
fn reading_tables() -> (Tables, griddle_core::schema::TypeKey) {
    let tables = Tables::default();
    tables.register(
        RecordDesc::new("Measure")
            .field("Value", Ty::F64, "")
            .field("Unit", Ty::String, ""),
    );
    let key = tables.register(
        RecordDesc::new("Reading")
            .field("ID", Ty::I64, "id,pk")
            .embed("Temp", Ty::strukt("Measure"), "")
            .field("Note", Ty::String, "note,alias:comment")
            .field("Raw", Ty::Bytes, "-"),
    );
    (tables, key)
}

#[test]
fn embedded_attributes_contribute_their_fields() {
    let (tables, key) = reading_tables();
    let table = tables.get(&key).unwrap();

    let value = table.field("value").unwrap();
    assert_eq!(value.attr_name, "Value");
    assert_eq!(value.index, vec![1, 0]);

    let unit = table.field("unit").unwrap();
    assert_eq!(unit.index, vec![1, 1]);

    let names: Vec<_> = table.fields().iter().map(|f| f.name.clone()).collect();
    assert_eq!(names, ["id", "value", "unit", "note"]);
}

#[test]
fn alias_resolves_to_the_same_field() {
    let (tables, key) = reading_tables();
    let table = tables.get(&key).unwrap();

    assert!(table.has_field("comment"));
    let via_alias = table.field("comment").unwrap();
    assert_eq!(via_alias.name, "note");
}

#[test]
fn skipped_fields_stay_addressable_but_are_not_columns() {
    let (tables, key) = reading_tables();
    let table = tables.get(&key).unwrap();

    assert!(table.has_field("raw"));
    assert!(table.fields().iter().all(|f| f.name != "raw"));
    assert!(table.data_fields().iter().all(|f| f.name != "raw"));
    assert!(table.all_fields().iter().any(|f| f.name == "raw"));
}

#[test]
fn later_field_with_the_same_column_name_replaces_the_earlier_one() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Person")
            .field("ID", Ty::I64, "id,pk")
            .field("Name", Ty::String, "")
            .field("FullName", Ty::String, "name"),
    );

    let table = tables.get(&key).unwrap();
    assert_eq!(table.field("name").unwrap().attr_name, "FullName");
    assert_eq!(table.fields().len(), 2);
}

#[test]
fn unknown_column_lookups_fail_with_the_column_name() {
    let (tables, key) = reading_tables();
    let table = tables.get(&key).unwrap();

    let err = table.field("celsius").unwrap_err();
    assert!(err.is_unknown_column());
    assert_eq!(err.to_string(), "model=Reading does not have column=celsius");
}

#[test]
fn unique_groups_collect_their_member_fields() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Booking")
            .field("ID", Ty::I64, "id,pk")
            .field("RoomID", Ty::I64, "room_id,unique:room_per_day")
            .field("Day", Ty::String, "day,unique:room_per_day")
            .field("Code", Ty::String, "code,unique:code"),
    );

    let table = tables.get(&key).unwrap();
    let unique = table.unique();
    assert_eq!(unique.len(), 2);

    let group: Vec<_> = unique["room_per_day"].iter().map(|f| f.name.clone()).collect();
    assert_eq!(group, ["room_id", "day"]);
    assert_eq!(unique["code"].len(), 1);
}

#[test]
fn field_flags_come_from_the_tag() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Order")
            .field("ID", Ty::I64, "id,pk")
            .field("Status", Ty::String, "status,notnull,default:'new'")
            .field("Discount", Ty::F64, "discount,nullzero"),
    );

    let table = tables.get(&key).unwrap();
    let status = table.field("status").unwrap();
    assert!(status.not_null);
    assert_eq!(status.sql_default.as_deref(), Some("'new'"));

    let discount = table.field("discount").unwrap();
    assert!(discount.null_zero);
    assert!(!discount.not_null);
}

#[test]
fn sql_types_are_discovered_and_overridable() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Doc")
            .field("ID", Ty::I64, "id,pk")
            .field("Body", Ty::String, "body,type:text"),
    );

    let table = tables.get(&key).unwrap();
    assert_eq!(table.field("id").unwrap().sql_type(), "BIGINT");

    let body = table.field("body").unwrap();
    assert_eq!(body.sql_type(), "text");
    assert_eq!(body.discovered_sql_type, "VARCHAR");
    assert_eq!(body.create_sql_type(), "text");
}
