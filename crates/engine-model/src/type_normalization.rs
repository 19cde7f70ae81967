// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::{
    Pos, Positioned,
    types::{BaseType, FieldDefinition, Type, TypeDefinition, TypeKind},
};
use async_graphql_value::Name;

pub fn default_positioned<T>(value: T) -> Positioned<T> {
    Positioned::new(value, Pos::default())
}

pub fn default_positioned_name(value: &str) -> Positioned<Name> {
    default_positioned(Name::new(value))
}

/// The named type at the bottom of any list/non-null wrapping.
pub fn underlying_type(typ: &Type) -> &Name {
    match &typ.base {
        BaseType::Named(name) => name,
        BaseType::List(typ) => underlying_type(typ),
    }
}

/// Deal with variants of `TypeDefinition` to give a uniform view suitable for
/// execution (field lookup, kind dispatch, membership checks).
pub trait TypeDefinitionIntrospection {
    fn name(&self) -> &str;
    fn kind(&self) -> String;
    fn description(&self) -> Option<String>;
    fn fields(&self) -> Option<&Vec<Positioned<FieldDefinition>>>;
    fn field_definition(&self, field_name: &str) -> Option<&FieldDefinition>;
    fn interfaces(&self) -> Option<&Vec<Positioned<Name>>>;
    fn union_members(&self) -> Option<&Vec<Positioned<Name>>>;
    fn is_abstract(&self) -> bool;
    fn is_composite(&self) -> bool;
}

impl TypeDefinitionIntrospection for TypeDefinition {
    fn name(&self) -> &str {
        self.name.node.as_str()
    }

    fn kind(&self) -> String {
        match self.kind {
            TypeKind::Scalar => "SCALAR".to_owned(),
            TypeKind::Object(_) => "OBJECT".to_owned(),
            TypeKind::Interface(_) => "INTERFACE".to_owned(),
            TypeKind::Union(_) => "UNION".to_owned(),
            TypeKind::Enum(_) => "ENUM".to_owned(),
            TypeKind::InputObject(_) => "INPUT_OBJECT".to_owned(),
        }
    }

    fn description(&self) -> Option<String> {
        self.description.as_ref().map(|d| d.node.to_owned())
    }

    fn fields(&self) -> Option<&Vec<Positioned<FieldDefinition>>> {
        match &self.kind {
            TypeKind::Object(value) => Some(&value.fields),
            TypeKind::Interface(value) => Some(&value.fields),
            _ => None,
        }
    }

    fn field_definition(&self, field_name: &str) -> Option<&FieldDefinition> {
        self.fields().and_then(|fields| {
            fields
                .iter()
                .find(|f| f.node.name.node.as_str() == field_name)
                .map(|f| &f.node)
        })
    }

    fn interfaces(&self) -> Option<&Vec<Positioned<Name>>> {
        match &self.kind {
            TypeKind::Object(value) => Some(&value.implements),
            TypeKind::Interface(value) => Some(&value.implements),
            _ => None,
        }
    }

    fn union_members(&self) -> Option<&Vec<Positioned<Name>>> {
        match &self.kind {
            TypeKind::Union(value) => Some(&value.members),
            _ => None,
        }
    }

    fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface(_) | TypeKind::Union(_))
    }

    fn is_composite(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Object(_) | TypeKind::Interface(_) | TypeKind::Union(_)
        )
    }
}

/// Is `provided` usable where `declared` is expected? Equal shapes are
/// compatible, and a non-null type may stand in for its nullable form.
pub fn types_compatible(provided: &Type, declared: &Type) -> bool {
    if declared.nullable && !provided.nullable {
        // covariance: a stricter (non-null) field satisfies a nullable declaration
        let relaxed = Type {
            base: provided.base.clone(),
            nullable: true,
        };
        return types_compatible(&relaxed, declared);
    }

    if provided.nullable != declared.nullable {
        return false;
    }

    match (&provided.base, &declared.base) {
        (BaseType::Named(p), BaseType::Named(d)) => p == d,
        (BaseType::List(p), BaseType::List(d)) => types_compatible(p, d),
        _ => false,
    }
}
