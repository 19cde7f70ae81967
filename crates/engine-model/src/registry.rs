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

use crate::error::SchemaBuildError;
use crate::type_normalization::TypeDefinitionIntrospection;

/// All named types of a schema, in registration order, with a name index.
///
/// Types reference each other by name only (field types, union members,
/// implemented interfaces), so the registry doubles as the arena that breaks
/// what would otherwise be ownership cycles between definitions.
///
/// For each interface and union the registry carries the closed set of
/// concrete object types the abstract type may resolve to. The set is
/// computed once, when the schema is sealed, and is immutable afterwards.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    type_definitions: Vec<TypeDefinition>,
    index: HashMap<String, usize>,
    possible_types: HashMap<String, Vec<String>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_definition: TypeDefinition) -> Result<(), SchemaBuildError> {
        let name = type_definition.name().to_owned();
        if self.index.contains_key(&name) {
            return Err(SchemaBuildError::DuplicateType(name));
        }
        self.index.insert(name, self.type_definitions.len());
        self.type_definitions.push(type_definition);
        Ok(())
    }

    pub fn get_type_definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.index
            .get(type_name)
            .map(|index| &self.type_definitions[*index])
    }

    pub fn type_definitions(&self) -> &[TypeDefinition] {
        &self.type_definitions
    }

    /// The concrete object types an interface or union may resolve to, in
    /// registration order. Empty for unsealed registries, concrete types,
    /// and unknown names.
    pub fn possible_types(&self, abstract_type_name: &str) -> &[String] {
        self.possible_types
            .get(abstract_type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_possible_type(&self, abstract_type_name: &str, concrete_type_name: &str) -> bool {
        self.possible_types(abstract_type_name)
            .iter()
            .any(|name| name == concrete_type_name)
    }

    /// Precompute the possible-types sets. Interface membership comes from
    /// the `implements` list of each object type; union membership from the
    /// union's declared members.
    pub(crate) fn seal(&mut self) {
        let mut possible_types: HashMap<String, Vec<String>> = HashMap::new();

        for type_definition in &self.type_definitions {
            match &type_definition.kind {
                TypeKind::Object(object_type) => {
                    for interface in &object_type.implements {
                        possible_types
                            .entry(interface.node.to_string())
                            .or_default()
                            .push(type_definition.name().to_owned());
                    }
                }
                TypeKind::Union(union_type) => {
                    let members = union_type
                        .members
                        .iter()
                        .map(|member| member.node.to_string())
                        .collect();
                    possible_types.insert(type_definition.name().to_owned(), members);
                }
                TypeKind::Interface(_) => {
                    // an interface nothing implements still gets an (empty) entry
                    possible_types
                        .entry(type_definition.name().to_owned())
                        .or_default();
                }
                _ => {}
            }
        }

        self.possible_types = possible_types;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{
        create_field, interface_type_definition, object_type_definition, union_type_definition,
    };

    fn tag_registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register(interface_type_definition(
                "Tag",
                None,
                vec![create_field("alias", "ID", None, vec![])],
            ))
            .unwrap();
        registry
            .register(object_type_definition(
                "StringTag",
                None,
                vec!["Tag"],
                vec![
                    create_field("alias", "ID", None, vec![]),
                    create_field("value", "String", None, vec![]),
                ],
            ))
            .unwrap();
        registry
            .register(object_type_definition(
                "IntegerTag",
                None,
                vec!["Tag"],
                vec![
                    create_field("alias", "ID", None, vec![]),
                    create_field("value", "Int", None, vec![]),
                ],
            ))
            .unwrap();
        registry
            .register(union_type_definition(
                "AnyTag",
                None,
                vec!["StringTag", "IntegerTag"],
            ))
            .unwrap();
        registry.seal();
        registry
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = TypeRegistry::new();
        registry
            .register(object_type_definition("Concert", None, vec![], vec![]))
            .unwrap();
        let result = registry.register(object_type_definition("Concert", None, vec![], vec![]));
        assert!(matches!(result, Err(SchemaBuildError::DuplicateType(name)) if name == "Concert"));
    }

    #[test]
    fn interface_possible_types_follow_registration_order() {
        let registry = tag_registry();
        assert_eq!(registry.possible_types("Tag"), ["StringTag", "IntegerTag"]);
    }

    #[test]
    fn union_possible_types_follow_declaration() {
        let registry = tag_registry();
        assert_eq!(
            registry.possible_types("AnyTag"),
            ["StringTag", "IntegerTag"]
        );
        assert!(registry.is_possible_type("AnyTag", "IntegerTag"));
        assert!(!registry.is_possible_type("AnyTag", "Tag"));
    }

    #[test]
    fn concrete_types_have_no_possible_types() {
        let registry = tag_registry();
        assert!(registry.possible_types("StringTag").is_empty());
        assert!(registry.possible_types("Unknown").is_empty());
    }
}
