use chrono::{DateTime, TimeZone, Utc};
use colflag::access::{DataType, Value};
use colflag::catalog::{Catalog, ColumnInfo, Mapper};
use colflag::expression::Expression;
use colflag::model::{MappedObject, Model};
use colflag::resolver::{AttributeResolver, InspectingResolver, PrefetchedResolver};
use colflag::{FlagError, column_flag};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 6, d, 0, 0, 0).unwrap()
}

fn message_model(catalog: &Arc<Catalog>) -> Model {
    let table = catalog
        .create_table(
            "message",
            vec![
                ColumnInfo::new("id", DataType::Int32),
                ColumnInfo::new("content", DataType::Varchar),
                ColumnInfo::new("sent_at", DataType::Timestamp),
                ColumnInfo::new("delivery_date", DataType::Timestamp),
            ],
        )
        .unwrap();
    let mapper = catalog
        .map_class(
            Mapper::builder("Message", &table)
                .column("id")
                .column("content")
                .column("sent_at")
                .column_as("delivered_at", "delivery_date"),
        )
        .unwrap();

    let content = table.get_column("content").unwrap();
    let sent_at = table.get_column("sent_at").unwrap();
    let delivered_at = table.get_column("delivery_date").unwrap();
    Model::builder(&mapper)
        .flag("has_content", column_flag(content.expr()).build().unwrap())
        .flag(
            "is_sent",
            column_flag(sent_at.expr())
                .default_with(|| Value::Timestamp(Utc::now()))
                .build()
                .unwrap(),
        )
        .flag(
            "is_sent_scalar",
            column_flag(sent_at.expr()).default(day(1)).build().unwrap(),
        )
        .flag(
            "is_delivered",
            column_flag(delivered_at.expr())
                .default_with(|| Value::Timestamp(Utc::now()))
                .on_demand(catalog.clone())
                .build()
                .unwrap(),
        )
        .flag(
            "in_transit",
            column_flag(sent_at.expr() & !delivered_at.expr())
                .build()
                .unwrap(),
        )
        .build(&**catalog)
        .unwrap()
}

#[test]
fn test_flag_initial_value() {
    let catalog = Arc::new(Catalog::new());
    let model = message_model(&catalog);

    let cases = [
        (Value::Null, false),
        (Value::from(""), true),
        (Value::from("spam"), true),
    ];
    for (content, expected) in cases {
        let message = model.create([("content", content)]).unwrap();
        assert_eq!(model.get_flag(&message, "has_content").unwrap(), expected);
    }
}

#[test]
fn test_in_transit_combinations() {
    let catalog = Arc::new(Catalog::new());
    let model = message_model(&catalog);

    let cases = [
        (None, None, false),
        (Some(day(1)), None, true),
        (None, Some(day(1)), false),
        (Some(day(1)), Some(day(2)), false),
    ];
    for (sent_at, delivered_at, expected) in cases {
        let message = model
            .create([
                ("sent_at", Value::from(sent_at)),
                ("delivered_at", Value::from(delivered_at)),
            ])
            .unwrap();
        assert_eq!(model.get_flag(&message, "in_transit").unwrap(), expected);
    }
}

#[test]
fn test_flag_runtime_evaluation() {
    let catalog = Arc::new(Catalog::new());
    let model = message_model(&catalog);
    let mut message = model.create([("content", "Spam")]).unwrap();

    model.write(&mut message, "sent_at", day(1)).unwrap();
    assert!(model.get_flag(&message, "in_transit").unwrap());

    model.write(&mut message, "delivered_at", day(2)).unwrap();
    assert!(!model.get_flag(&message, "in_transit").unwrap());
}

#[test]
fn test_assign_defaults() {
    let catalog = Arc::new(Catalog::new());
    let model = message_model(&catalog);
    let mut message = model.new_record();

    let before = Utc::now();
    model.write(&mut message, "is_sent", true).unwrap();
    assert!(model.get_flag(&message, "is_sent").unwrap());
    match message.attribute("sent_at") {
        Some(Value::Timestamp(sent_at)) => assert!(*sent_at >= before),
        other => panic!("expected a timestamp, got {:?}", other),
    }

    model.write(&mut message, "is_sent_scalar", true).unwrap();
    assert_eq!(
        message.attribute("sent_at"),
        Some(&Value::Timestamp(day(1)))
    );

    // Renamed attribute behind an on-demand resolver
    model.write(&mut message, "is_delivered", true).unwrap();
    assert!(matches!(
        message.attribute("delivered_at"),
        Some(Value::Timestamp(_))
    ));

    for (flag, attribute) in [("is_sent", "sent_at"), ("is_delivered", "delivered_at")] {
        model.write(&mut message, flag, false).unwrap();
        assert!(!model.get_flag(&message, flag).unwrap());
        assert_eq!(message.attribute(attribute), Some(&Value::Null));
    }
}

#[test]
fn test_default_at_creation() {
    let catalog = Arc::new(Catalog::new());
    let model = message_model(&catalog);

    let message = model
        .create([("is_sent_scalar", Value::Boolean(true))])
        .unwrap();
    assert_eq!(
        message.attribute("sent_at"),
        Some(&Value::Timestamp(day(1)))
    );

    // Flags are applied after plain attributes
    let message = model
        .create([
            ("is_sent_scalar", Value::Boolean(false)),
            ("sent_at", Value::Timestamp(day(3))),
        ])
        .unwrap();
    assert_eq!(message.attribute("sent_at"), Some(&Value::Null));
}

#[test]
fn test_assignment_errors() {
    let catalog = Arc::new(Catalog::new());
    let model = message_model(&catalog);
    let mut message = model.create([("content", "Spam")]).unwrap();

    for flag in ["has_content", "in_transit"] {
        assert!(matches!(
            model.write(&mut message, flag, true),
            Err(FlagError::ReadOnly)
        ));
    }
    assert!(matches!(
        model.create([("has_content", Value::Boolean(true))]),
        Err(FlagError::ReadOnly)
    ));

    for value in [Value::Int32(1), Value::from("yes"), Value::Null] {
        let err = model.write(&mut message, "is_sent", value).unwrap_err();
        assert!(err.to_string().starts_with("Flag only accepts boolean values"));
    }
    assert_eq!(message.attribute("sent_at"), Some(&Value::Null));
    assert_eq!(message.attribute("content"), Some(&Value::from("Spam")));
}

#[test]
fn test_flag_predicates() {
    let catalog = Arc::new(Catalog::new());
    let model = message_model(&catalog);

    assert_eq!(
        model.predicate("has_content").unwrap().to_string(),
        "message.content IS NOT NULL"
    );
    assert_eq!(
        model.predicate("in_transit").unwrap().to_string(),
        "message.sent_at IS NOT NULL AND message.delivery_date IS NULL"
    );
    assert!(matches!(
        model.predicate("is_spam"),
        Err(FlagError::UnknownAttribute { .. })
    ));
}

#[test]
fn test_table_inheritance() {
    let catalog = Arc::new(Catalog::new());
    let table = catalog
        .create_table(
            "booking",
            vec![
                ColumnInfo::new("id", DataType::Int32),
                ColumnInfo::new("type", DataType::Varchar),
                ColumnInfo::new("paid_at", DataType::Timestamp),
                ColumnInfo::new("cancelled_at", DataType::Timestamp),
            ],
        )
        .unwrap();
    let booking_mapper = catalog
        .map_class(
            Mapper::builder("Booking", &table)
                .column("id")
                .column("type")
                .column("paid_at")
                .polymorphic("type", "standard"),
        )
        .unwrap();
    let cancellable_mapper = catalog
        .map_class(
            Mapper::builder("CancellableBooking", &table)
                .inherits(&booking_mapper)
                .column("cancelled_at")
                .polymorphic_identity("cancellable"),
        )
        .unwrap();

    let paid_at = table.get_column("paid_at").unwrap();
    let cancelled_at = table.get_column("cancelled_at").unwrap();
    let booking = Model::builder(&booking_mapper)
        .flag("is_paid", column_flag(paid_at.expr()).build().unwrap())
        .build(&*catalog)
        .unwrap();
    let cancellable = Model::inherit(&booking, &cancellable_mapper)
        .flag("is_cancelled", column_flag(cancelled_at.expr()).build().unwrap())
        .build(&*catalog)
        .unwrap();

    let plain = booking
        .create([("paid_at", Value::Timestamp(Utc::now()))])
        .unwrap();
    assert!(booking.get_flag(&plain, "is_paid").unwrap());
    assert_eq!(plain.attribute("type"), Some(&Value::from("standard")));
    assert!(plain.attribute("cancelled_at").is_none());
    assert!(booking.get_flag(&plain, "is_cancelled").is_err());

    let mut sub = cancellable
        .create([("paid_at", Value::Timestamp(Utc::now()))])
        .unwrap();
    assert_eq!(sub.attribute("type"), Some(&Value::from("cancellable")));
    assert!(cancellable.get_flag(&sub, "is_paid").unwrap());
    assert!(!cancellable.get_flag(&sub, "is_cancelled").unwrap());
    cancellable
        .write(&mut sub, "cancelled_at", Utc::now())
        .unwrap();
    assert!(cancellable.get_flag(&sub, "is_cancelled").unwrap());
}

#[test]
fn test_ambiguous_attribute_names_across_mappers() {
    let catalog = Arc::new(Catalog::new());
    let table = catalog
        .create_table("test", vec![ColumnInfo::new("value", DataType::Varchar)])
        .unwrap();
    let value = table.get_column("value").unwrap();
    let columns = HashSet::from([value.clone()]);

    let prefetched = PrefetchedResolver::new(columns.clone());
    let inspecting = InspectingResolver::new(columns, catalog.clone());
    let resolvers: [&dyn AttributeResolver; 2] = [&prefetched, &inspecting];

    let base_mapper = catalog
        .map_class(Mapper::builder("Base", &table).column("value"))
        .unwrap();
    let alias_mapper = catalog
        .map_class(Mapper::builder("Alias", &table).column_as("alias", "value"))
        .unwrap();
    let base_model = Model::builder(&base_mapper).build(&*catalog).unwrap();
    let alias_model = Model::builder(&alias_mapper).build(&*catalog).unwrap();
    for resolver in resolvers {
        resolver.register(&*catalog, base_mapper.class_id()).unwrap();
        resolver.register(&*catalog, alias_mapper.class_id()).unwrap();
    }

    let base = base_model.create([("value", "spam")]).unwrap();
    let alias = alias_model.create([("alias", "eggs")]).unwrap();
    for resolver in resolvers {
        assert_eq!(resolver.single_name(&base).unwrap(), "value");
        assert_eq!(resolver.single_name(&alias).unwrap(), "alias");
        assert_eq!(resolver.value(&base, &value).unwrap(), Value::from("spam"));
        assert_eq!(resolver.value(&alias, &value).unwrap(), Value::from("eggs"));
    }
}

#[test]
fn test_resolver_equivalence() {
    let catalog = Arc::new(Catalog::new());
    let table = catalog
        .create_table(
            "resolver_thing",
            vec![
                ColumnInfo::new("id", DataType::Int32),
                ColumnInfo::new("named", DataType::Varchar),
                ColumnInfo::new("unnamed", DataType::Varchar),
            ],
        )
        .unwrap();
    let mapper = catalog
        .map_class(
            Mapper::builder("Thing", &table)
                .column("id")
                .column("named")
                .column_as("renamed", "unnamed"),
        )
        .unwrap();
    let model = Model::builder(&mapper).build(&*catalog).unwrap();
    let named = table.get_column("named").unwrap();
    let unnamed = table.get_column("unnamed").unwrap();
    let column_map = [("named", named.clone()), ("renamed", unnamed.clone())];

    let all = HashSet::from([named.clone(), unnamed.clone()]);
    let prefetched = PrefetchedResolver::new(all.clone());
    prefetched.register(&*catalog, mapper.class_id()).unwrap();
    let inspecting = InspectingResolver::new(all, catalog.clone());

    let things = [
        model.new_record(),
        model
            .create([("named", Value::Null), ("renamed", Value::Null)])
            .unwrap(),
        model
            .create([("named", "ham"), ("renamed", "spam")])
            .unwrap(),
    ];
    for thing in &things {
        for (attr_name, column) in &column_map {
            let expected = thing.attribute(attr_name).cloned().unwrap();
            assert_eq!(prefetched.value(thing, column).unwrap(), expected);
            assert_eq!(inspecting.value(thing, column).unwrap(), expected);
        }
    }

    // Multi-column resolvers have no single name
    let err = prefetched.single_name(&things[0]).unwrap_err();
    assert_eq!(err.to_string(), "Resolver contains multiple columns");
    assert!(matches!(
        inspecting.single_name(&things[0]),
        Err(FlagError::MultipleColumns)
    ));

    for (attr_name, column) in &column_map {
        let single = PrefetchedResolver::new(HashSet::from([column.clone()]));
        single.register(&*catalog, mapper.class_id()).unwrap();
        assert_eq!(single.single_name(&things[0]).unwrap(), *attr_name);
    }
}

#[test]
fn test_class_configured_after_registration_is_unknown() {
    let catalog = Arc::new(Catalog::new());
    let table = catalog
        .create_table("late", vec![ColumnInfo::new("value", DataType::Varchar)])
        .unwrap();
    let value = table.get_column("value").unwrap();
    let flag = Arc::new(column_flag(value.expr()).default("x").build().unwrap());

    let early = catalog
        .map_class(Mapper::builder("Early", &table).column("value"))
        .unwrap();
    flag.register(&*catalog, early.class_id()).unwrap();

    let late = catalog
        .map_class(Mapper::builder("Late", &table).column("value"))
        .unwrap();
    let late_model = Model::builder(&late).build(&*catalog).unwrap();
    let record = late_model.new_record();
    assert!(matches!(
        flag.get(&record),
        Err(FlagError::UnregisteredClass { .. })
    ));
}

#[test]
fn test_unsupported_expressions() {
    let catalog = Arc::new(Catalog::new());
    let table = catalog
        .create_table("t", vec![ColumnInfo::new("int_a", DataType::Int32)])
        .unwrap();
    let int_a = table.get_column("int_a").unwrap();

    let err = column_flag(Expression::function(
        "exp",
        vec![int_a.expr(), Expression::literal(2)],
    ))
    .build()
    .unwrap_err();
    assert!(err.to_string().contains("Unsupported expression"));

    let err = column_flag(Expression::custom_op("^", int_a.expr(), Expression::literal(2)))
        .build()
        .unwrap_err();
    assert!(err.to_string().contains("Unsupported operator"));
}

#[test]
fn test_flags_shared_across_threads() {
    let catalog = Arc::new(Catalog::new());
    let model = Arc::new(message_model(&catalog));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let model = model.clone();
            thread::spawn(move || {
                let content = if i % 2 == 0 { Some("hi") } else { None };
                let message = model.create([("content", Value::from(content))]).unwrap();
                model.get_flag(&message, "has_content").unwrap()
            })
        })
        .collect();

    let results: Vec<bool> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results, vec![true, false, true, false]);
}
