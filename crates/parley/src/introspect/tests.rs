// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Introspection over hand-written shapes.

use super::*;
use crate::model::{Definitions, Form, PrimitiveKind, TypeDef};
use crate::rpc::RegistrationError;
use crate::value::{Model, Optional};

/// Self-referential record: `Node { label, children: Vec<Node>, parent: Option<Box<Node>> }`.
struct Node;
/// Record reached twice from `Pair`.
struct Point;
struct Pair;
/// Anonymous record nested in `Order`.
struct Address;
struct Order;
struct AnonymousRoot;
struct WithWide;

fn record(info: TypeInfo, fields: fn() -> Vec<FieldShape>) -> Shape {
    Shape::Record(RecordShape { info, fields })
}

fn node_shape() -> Shape {
    record(TypeInfo::of::<Node>().named("Node"), || {
        vec![
            FieldShape::new("label", String::shape()),
            FieldShape::new("children", Shape::Array(Box::new(node_shape()))),
            FieldShape::new("parent", Shape::Nullable(Box::new(node_shape()))),
        ]
    })
}

fn point_shape() -> Shape {
    record(TypeInfo::of::<Point>().named("Point"), || {
        vec![
            FieldShape::new("x", f64::shape()),
            FieldShape::new("y", f64::shape()),
        ]
    })
}

fn pair_shape() -> Shape {
    record(TypeInfo::of::<Pair>().named("Pair"), || {
        vec![
            FieldShape::new("from", point_shape()),
            FieldShape::new("to", point_shape()),
        ]
    })
}

fn order_shape() -> Shape {
    record(TypeInfo::of::<Order>().named("Order"), || {
        vec![
            FieldShape::new("id", String::shape()),
            FieldShape::new(
                "shipping_address",
                record(TypeInfo::of::<Address>(), || {
                    vec![FieldShape::new("street", String::shape())]
                }),
            )
            .described("Where the parcel goes"),
            FieldShape::new("note", Optional::<Option<String>>::shape()),
        ]
    })
}

#[test]
fn test_cyclic_record_terminates_with_one_definition() {
    let mut defs = Definitions::new();
    let name = Introspector::new(&mut defs, "tree.get", Role::Response)
        .root(&node_shape())
        .expect("introspect");

    assert_eq!(name.as_deref(), Some("Node"));
    assert_eq!(defs.len(), 1);
    let Form::Properties(object) = &defs.get("Node").expect("Node").form else {
        panic!("Node must be an object");
    };
    let children = object.property("children").expect("children");
    assert_eq!(children.def, TypeDef::elements(TypeDef::reference("Node")));
    let parent = object.property("parent").expect("parent");
    assert_eq!(parent.def, TypeDef::reference("Node").with_nullable(true));
    assert!(defs.unresolved_refs().is_empty());
}

#[test]
fn test_repeated_type_shares_one_definition() {
    let mut defs = Definitions::new();
    Introspector::new(&mut defs, "geo.measure", Role::Params)
        .root(&pair_shape())
        .expect("introspect");
    Introspector::new(&mut defs, "geo.locate", Role::Response)
        .root(&point_shape())
        .expect("introspect again");

    let names: Vec<_> = defs.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["Pair", "Point"]);
}

#[test]
fn test_anonymous_nested_record_gets_synthesized_name() {
    let mut defs = Definitions::new();
    Introspector::new(&mut defs, "shop.placeOrder", Role::Params)
        .root(&order_shape())
        .expect("introspect");

    let synthesized = "ShopPlaceOrderShippingAddressParams";
    assert!(defs.get(synthesized).is_some());
    let Form::Properties(object) = &defs.get("Order").expect("Order").form else {
        panic!("Order must be an object");
    };
    let address = object.property("shipping_address").expect("address");
    assert_eq!(address.def.ref_name(), Some(synthesized));
    assert_eq!(
        address.def.metadata.description.as_deref(),
        Some("Where the parcel goes")
    );

    let note = object.property("note").expect("note");
    assert!(note.optional);
    assert!(note.def.nullable);
    assert_eq!(note.def.form, Form::Type(PrimitiveKind::String));
}

#[test]
fn test_anonymous_root_is_rejected() {
    let mut defs = Definitions::new();
    let shape = record(TypeInfo::of::<AnonymousRoot>(), || {
        vec![FieldShape::new("id", String::shape())]
    });
    let err = Introspector::new(&mut defs, "users.create", Role::Params)
        .root(&shape)
        .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::AnonymousRoot {
            procedure: "users.create".into(),
            role: Role::Params,
            suggested: "UsersCreateParams".into(),
        }
    );
    assert!(defs.is_empty());
}

#[test]
fn test_non_record_root_and_unit() {
    let mut defs = Definitions::new();
    let err = Introspector::new(&mut defs, "misc.count", Role::Response)
        .root(&u32::shape())
        .unwrap_err();
    assert!(matches!(err, RegistrationError::NonRecordRoot { .. }));

    let none = Introspector::new(&mut defs, "misc.ping", Role::Params)
        .root(&<()>::shape())
        .expect("unit");
    assert_eq!(none, None);
}

#[test]
fn test_unsupported_kind_reports_path() {
    let mut defs = Definitions::new();
    let shape = record(TypeInfo::of::<WithWide>().named("WithWide"), || {
        vec![FieldShape::new("total", Shape::Array(Box::new(i128::shape())))]
    });
    let err = Introspector::new(&mut defs, "misc.sum", Role::Response)
        .root(&shape)
        .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::Unsupported {
            kind: "i128".into(),
            path: "/total".into(),
        }
    );
}

#[test]
fn test_name_collision_between_distinct_types() {
    let mut defs = Definitions::new();
    Introspector::new(&mut defs, "a.one", Role::Response)
        .root(&point_shape())
        .expect("first");
    let impostor = record(TypeInfo::of::<Pair>().named("Point"), || Vec::new());
    let err = Introspector::new(&mut defs, "a.two", Role::Response)
        .root(&impostor)
        .unwrap_err();
    assert!(matches!(err, RegistrationError::Model(_)));
}
