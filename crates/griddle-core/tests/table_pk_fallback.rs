use griddle_core::schema::{RecordDesc, Tables, Ty};

#[test]
fn id_column_is_promoted_when_no_pk_is_tagged() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Session")
            .field("ID", Ty::I64, "")
            .field("Token", Ty::String, ""),
    );

    let table = tables.get(&key).unwrap();
    let pks = table.pks();
    assert_eq!(pks.len(), 1);
    assert_eq!(pks[0].name, "id");
    assert!(pks[0].is_pk);
    assert!(pks[0].auto_increment);

    // Promoted out of the data fields, still in the column list and map.
    assert!(table.data_fields().iter().all(|f| f.name != "id"));
    assert_eq!(table.fields().len(), 2);
    assert!(table.field("id").unwrap().is_pk);
}

#[test]
fn uuid_and_pk_model_are_fallback_candidates() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Device")
            .field("UUID", Ty::String, "")
            .field("Name", Ty::String, ""),
    );
    let table = tables.get(&key).unwrap();
    assert_eq!(table.pks()[0].name, "uuid");

    let key = tables.register(
        RecordDesc::new("Widget")
            .field("PkWidget", Ty::I64, "")
            .field("Name", Ty::String, ""),
    );
    let table = tables.get(&key).unwrap();
    assert_eq!(table.pks()[0].name, "pk_widget");
    assert!(table.pks()[0].auto_increment);
}

#[test]
fn id_wins_over_other_candidates() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Job")
            .field("UUID", Ty::String, "")
            .field("ID", Ty::I64, ""),
    );
    let table = tables.get(&key).unwrap();
    assert_eq!(table.pks().len(), 1);
    assert_eq!(table.pks()[0].name, "id");
}

#[test]
fn tagged_pk_disables_fallback_and_auto_increment() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Account")
            .field("Number", Ty::String, "number,pk")
            .field("ID", Ty::I64, ""),
    );

    let table = tables.get(&key).unwrap();
    let pks = table.pks();
    assert_eq!(pks.len(), 1);
    assert_eq!(pks[0].name, "number");
    assert!(!pks[0].auto_increment);

    // The would-be fallback candidate stays an ordinary data field.
    assert!(!table.field("id").unwrap().is_pk);
}

#[test]
fn autoincrement_tag_is_honored_on_explicit_pks() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Ticket").field("ID", Ty::I64, "id,pk,autoincrement"),
    );
    let table = tables.get(&key).unwrap();
    assert!(table.pks()[0].auto_increment);
}

#[test]
fn promotion_reaches_every_holder_of_the_field() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Coupon")
            .field("ID", Ty::I64, "id,unique:grp")
            .field("Code", Ty::String, ""),
    );

    let table = tables.get(&key).unwrap();
    assert!(table.pks()[0].is_pk);
    assert!(table.pks()[0].auto_increment);

    // Unique groups hand out the same promoted field, not a stale
    // pre-promotion copy.
    let member = &table.unique()["grp"][0];
    assert!(member.is_pk);
    assert!(member.auto_increment);

    for holder in [
        table.field("id").unwrap(),
        table.all_fields().iter().find(|f| f.name == "id").unwrap().clone(),
    ] {
        assert!(holder.is_pk);
    }
}

#[test]
fn table_without_keys_reports_missing_primary_keys() {
    let tables = Tables::default();
    let key = tables.register(
        RecordDesc::new("Note")
            .field("Body", Ty::String, "")
            .field("Pinned", Ty::Bool, ""),
    );

    let table = tables.get(&key).unwrap();
    assert!(table.pks().is_empty());

    let err = table.check_pks().unwrap_err();
    assert!(err.is_missing_primary_key());
    assert_eq!(err.to_string(), "model=Note does not have primary keys");
}
