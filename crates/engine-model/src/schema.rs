// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::types::{TypeDefinition, TypeKind};
use tracing::instrument;

use crate::definition::scalar_type_definition;
use crate::error::SchemaBuildError;
use crate::registry::TypeRegistry;
use crate::resolver::{FieldResolverFn, TypeResolverFn};
use crate::type_normalization::{TypeDefinitionIntrospection, types_compatible, underlying_type};

pub const BUILT_IN_SCALARS: [&str; 5] = ["Int", "Float", "String", "Boolean", "ID"];

/// A closed-world schema: the type registry, the root operation types, and
/// the resolver bindings. Built once at startup and read-only during
/// execution, so it may be shared (behind an `Arc`) by any number of
/// concurrent requests.
pub struct Schema {
    registry: TypeRegistry,
    query_type_name: String,
    mutation_type_name: Option<String>,
    field_resolvers: HashMap<String, HashMap<String, FieldResolverFn>>,
    type_resolvers: HashMap<String, TypeResolverFn>,
}

impl Schema {
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn query_type(&self) -> &TypeDefinition {
        // existence enforced by `SchemaBuilder::build`
        self.registry
            .get_type_definition(&self.query_type_name)
            .expect("query root type vanished from a built schema")
    }

    pub fn mutation_type(&self) -> Option<&TypeDefinition> {
        self.mutation_type_name
            .as_deref()
            .and_then(|name| self.registry.get_type_definition(name))
    }

    pub fn get_type_definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.registry.get_type_definition(type_name)
    }

    pub fn field_resolver(&self, type_name: &str, field_name: &str) -> Option<&FieldResolverFn> {
        self.field_resolvers
            .get(type_name)
            .and_then(|fields| fields.get(field_name))
    }

    pub fn type_resolver(&self, abstract_type_name: &str) -> Option<&TypeResolverFn> {
        self.type_resolvers.get(abstract_type_name)
    }
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("query_type_name", &self.query_type_name)
            .field("mutation_type_name", &self.mutation_type_name)
            .field("types", &self.registry.type_definitions().len())
            .finish()
    }
}

/// Assembles a [`Schema`], enforcing its invariants when `build` is called:
/// a registered query root, no dangling type references, interface
/// conformance of every possible type, and a type resolver for every
/// abstract type.
pub struct SchemaBuilder {
    registry: TypeRegistry,
    query_type_name: Option<String>,
    mutation_type_name: Option<String>,
    field_resolvers: HashMap<String, HashMap<String, FieldResolverFn>>,
    type_resolvers: HashMap<String, TypeResolverFn>,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    pub fn new() -> Self {
        let mut registry = TypeRegistry::new();
        for scalar in BUILT_IN_SCALARS {
            // a fresh registry cannot already contain a built-in
            registry
                .register(scalar_type_definition(scalar))
                .expect("built-in scalar registration");
        }

        Self {
            registry,
            query_type_name: None,
            mutation_type_name: None,
            field_resolvers: HashMap::new(),
            type_resolvers: HashMap::new(),
        }
    }

    pub fn register(&mut self, type_definition: TypeDefinition) -> Result<(), SchemaBuildError> {
        self.registry.register(type_definition)
    }

    pub fn query(&mut self, type_name: &str) -> &mut Self {
        self.query_type_name = Some(type_name.to_owned());
        self
    }

    pub fn mutation(&mut self, type_name: &str) -> &mut Self {
        self.mutation_type_name = Some(type_name.to_owned());
        self
    }

    pub fn field_resolver(
        &mut self,
        type_name: &str,
        field_name: &str,
        resolver: FieldResolverFn,
    ) -> &mut Self {
        self.field_resolvers
            .entry(type_name.to_owned())
            .or_default()
            .insert(field_name.to_owned(), resolver);
        self
    }

    pub fn type_resolver(&mut self, abstract_type_name: &str, resolver: TypeResolverFn) -> &mut Self {
        self.type_resolvers
            .insert(abstract_type_name.to_owned(), resolver);
        self
    }

    #[instrument(name = "SchemaBuilder::build", skip_all)]
    pub fn build(mut self) -> Result<Schema, SchemaBuildError> {
        let query_type_name = self
            .query_type_name
            .take()
            .ok_or(SchemaBuildError::MissingQueryRoot)?;

        self.check_root_type(&query_type_name)?;
        if let Some(mutation_type_name) = self.mutation_type_name.clone() {
            self.check_root_type(&mutation_type_name)?;
        }

        self.check_type_references()?;
        self.check_interface_conformance()?;
        self.check_resolver_bindings()?;

        self.registry.seal();

        Ok(Schema {
            registry: self.registry,
            query_type_name,
            mutation_type_name: self.mutation_type_name,
            field_resolvers: self.field_resolvers,
            type_resolvers: self.type_resolvers,
        })
    }

    fn check_root_type(&self, type_name: &str) -> Result<(), SchemaBuildError> {
        let type_definition = self.registry.get_type_definition(type_name).ok_or_else(|| {
            SchemaBuildError::UnknownType {
                name: type_name.to_owned(),
                referenced_by: "schema roots".to_owned(),
            }
        })?;

        match type_definition.kind {
            TypeKind::Object(_) => Ok(()),
            _ => Err(SchemaBuildError::InvalidRootType(type_name.to_owned())),
        }
    }

    /// Every name mentioned by a registered type (field types, argument
    /// types, union members, implemented interfaces) must itself be
    /// registered.
    fn check_type_references(&self) -> Result<(), SchemaBuildError> {
        let unknown = |name: &str, referenced_by: &str| SchemaBuildError::UnknownType {
            name: name.to_owned(),
            referenced_by: referenced_by.to_owned(),
        };

        for type_definition in self.registry.type_definitions() {
            let type_name = type_definition.name();

            if let Some(fields) = type_definition.fields() {
                for field in fields {
                    let field_type = underlying_type(&field.node.ty.node);
                    if self.registry.get_type_definition(field_type).is_none() {
                        return Err(unknown(field_type, type_name));
                    }
                    for argument in &field.node.arguments {
                        let argument_type = underlying_type(&argument.node.ty.node);
                        if self.registry.get_type_definition(argument_type).is_none() {
                            return Err(unknown(argument_type, type_name));
                        }
                    }
                }
            }

            if let Some(interfaces) = type_definition.interfaces() {
                for interface in interfaces {
                    if self
                        .registry
                        .get_type_definition(interface.node.as_str())
                        .is_none()
                    {
                        return Err(unknown(interface.node.as_str(), type_name));
                    }
                }
            }

            if let Some(members) = type_definition.union_members() {
                for member in members {
                    match self.registry.get_type_definition(member.node.as_str()) {
                        None => return Err(unknown(member.node.as_str(), type_name)),
                        Some(member_definition) => {
                            if !matches!(member_definition.kind, TypeKind::Object(_)) {
                                return Err(SchemaBuildError::NonObjectUnionMember {
                                    union: type_name.to_owned(),
                                    member: member.node.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Every object implementing an interface must declare each of the
    /// interface's fields with a compatible signature.
    fn check_interface_conformance(&self) -> Result<(), SchemaBuildError> {
        for type_definition in self.registry.type_definitions() {
            let TypeKind::Object(object_type) = &type_definition.kind else {
                continue;
            };

            for interface_name in &object_type.implements {
                let Some(interface) = self
                    .registry
                    .get_type_definition(interface_name.node.as_str())
                else {
                    continue; // reported by check_type_references
                };

                let Some(interface_fields) = interface.fields() else {
                    continue;
                };

                for interface_field in interface_fields {
                    let compatible = type_definition
                        .field_definition(interface_field.node.name.node.as_str())
                        .map(|object_field| {
                            types_compatible(&object_field.ty.node, &interface_field.node.ty.node)
                        })
                        .unwrap_or(false);

                    if !compatible {
                        return Err(SchemaBuildError::IncompatibleInterfaceField {
                            interface: interface.name().to_owned(),
                            object: type_definition.name().to_owned(),
                            field: interface_field.node.name.node.to_string(),
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Field resolvers must target declared fields; type resolvers must
    /// target abstract types, and every abstract type must have one.
    fn check_resolver_bindings(&self) -> Result<(), SchemaBuildError> {
        for (type_name, fields) in &self.field_resolvers {
            let type_definition = self.registry.get_type_definition(type_name).ok_or_else(|| {
                SchemaBuildError::UnknownType {
                    name: type_name.to_owned(),
                    referenced_by: "field resolver bindings".to_owned(),
                }
            })?;

            for field_name in fields.keys() {
                if type_definition.field_definition(field_name).is_none() {
                    return Err(SchemaBuildError::UnknownField {
                        type_name: type_name.to_owned(),
                        field_name: field_name.to_owned(),
                    });
                }
            }
        }

        for type_name in self.type_resolvers.keys() {
            match self.registry.get_type_definition(type_name) {
                None => {
                    return Err(SchemaBuildError::UnknownType {
                        name: type_name.to_owned(),
                        referenced_by: "type resolver bindings".to_owned(),
                    });
                }
                Some(type_definition) if !type_definition.is_abstract() => {
                    return Err(SchemaBuildError::NotAbstractType(type_name.to_owned()));
                }
                Some(_) => {}
            }
        }

        for type_definition in self.registry.type_definitions() {
            if type_definition.is_abstract()
                && !self.type_resolvers.contains_key(type_definition.name())
            {
                return Err(SchemaBuildError::MissingTypeResolver(
                    type_definition.name().to_owned(),
                ));
            }
        }

        Ok(())
    }
}
