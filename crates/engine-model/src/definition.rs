// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::types::{
    BaseType, FieldDefinition, InputValueDefinition, InterfaceType, ObjectType, Type,
    TypeDefinition, TypeKind, UnionType,
};
use async_graphql_value::Name;

use crate::type_normalization::{default_positioned, default_positioned_name};

/// Building blocks for schema type definitions. Definitions are plain
/// `async_graphql_parser` AST nodes, so a schema built here is directly
/// comparable with one obtained from parsed SDL.
pub fn object_type_definition(
    name: &str,
    description: Option<&str>,
    implements: Vec<&str>,
    fields: Vec<FieldDefinition>,
) -> TypeDefinition {
    TypeDefinition {
        extend: false,
        description: description.map(|d| default_positioned(d.to_string())),
        name: default_positioned_name(name),
        directives: vec![],
        kind: TypeKind::Object(ObjectType {
            implements: implements
                .into_iter()
                .map(default_positioned_name)
                .collect(),
            fields: fields.into_iter().map(default_positioned).collect(),
        }),
    }
}

pub fn interface_type_definition(
    name: &str,
    description: Option<&str>,
    fields: Vec<FieldDefinition>,
) -> TypeDefinition {
    TypeDefinition {
        extend: false,
        description: description.map(|d| default_positioned(d.to_string())),
        name: default_positioned_name(name),
        directives: vec![],
        kind: TypeKind::Interface(InterfaceType {
            implements: vec![],
            fields: fields.into_iter().map(default_positioned).collect(),
        }),
    }
}

pub fn union_type_definition(
    name: &str,
    description: Option<&str>,
    members: Vec<&str>,
) -> TypeDefinition {
    TypeDefinition {
        extend: false,
        description: description.map(|d| default_positioned(d.to_string())),
        name: default_positioned_name(name),
        directives: vec![],
        kind: TypeKind::Union(UnionType {
            members: members.into_iter().map(default_positioned_name).collect(),
        }),
    }
}

pub fn scalar_type_definition(name: &str) -> TypeDefinition {
    TypeDefinition {
        extend: false,
        description: None,
        name: default_positioned_name(name),
        directives: vec![],
        kind: TypeKind::Scalar,
    }
}

/// Field declaration such as `alias: ID!` or `venue(id: Int!): Venue`. The
/// type is given in SDL syntax (`[Tag!]`, `Int!`, ...).
pub fn create_field(
    name: &str,
    typ: &str,
    description: Option<&str>,
    arguments: Vec<InputValueDefinition>,
) -> FieldDefinition {
    FieldDefinition {
        description: description.map(|d| default_positioned(d.to_string())),
        name: default_positioned_name(name),
        arguments: arguments.into_iter().map(default_positioned).collect(),
        ty: default_positioned(parse_type(typ)),
        directives: vec![],
    }
}

pub fn create_argument(name: &str, typ: &str) -> InputValueDefinition {
    InputValueDefinition {
        description: None,
        name: default_positioned_name(name),
        directives: vec![],
        default_value: None,
        ty: default_positioned(parse_type(typ)),
    }
}

fn parse_type(typ: &str) -> Type {
    // Malformed syntax falls back to a bare nullable name; the builder's
    // reachability check rejects such a name at build time.
    Type::new(typ).unwrap_or(Type {
        base: BaseType::Named(Name::new(typ)),
        nullable: true,
    })
}
