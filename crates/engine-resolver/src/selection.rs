// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::{HashMap, HashSet};

use async_graphql_parser::{
    Pos, Positioned,
    types::{
        Directive, Field, FieldDefinition, FragmentDefinition, Selection, SelectionSet,
        TypeDefinition,
    },
};
use async_graphql_value::{ConstValue, Name};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use engine_model::Schema;
use engine_model::type_normalization::TypeDefinitionIntrospection;

use crate::validation::validation_error::ValidationError;

pub const TYPENAME_FIELD: &str = "__typename";

/// One response key of a selection set, with every field node that merged
/// into it. The first occurrence determines the key's position, the field
/// name, and the arguments; sub-selections of later occurrences are executed
/// together with the first one's.
#[derive(Debug)]
pub struct CollectedField<'a> {
    pub output_name: String,
    pub field: &'a Positioned<Field>,
    merged: Vec<&'a Positioned<Field>>,
}

impl<'a> CollectedField<'a> {
    pub fn name(&self) -> &'a str {
        self.field.node.name.node.as_str()
    }

    pub fn pos(&self) -> Pos {
        self.field.pos
    }

    /// The selection sets to execute against this key's value, in bucket
    /// order.
    pub fn selection_sets(&self) -> Vec<&'a Positioned<SelectionSet>> {
        self.merged
            .iter()
            .map(|field| &field.node.selection_set)
            .collect()
    }
}

/// Flattens a selection set against one concrete object type: an ordered
/// response-key -> field-nodes mapping, with fragments applied or skipped
/// according to their type condition.
pub struct SelectionCollector<'a> {
    schema: &'a Schema,
    fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
    variables: &'a HashMap<Name, ConstValue>,
}

impl<'a> SelectionCollector<'a> {
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
        variables: &'a HashMap<Name, ConstValue>,
    ) -> Self {
        Self {
            schema,
            fragment_definitions,
            variables,
        }
    }

    /// Collect the fields to execute for `concrete_type`, in document order
    /// of first occurrence. Several selection sets may be passed when fields
    /// with the same response key merged at the level above: their items are
    /// walked as one list.
    ///
    /// Fragments (spread or inline) whose type condition does not match
    /// `concrete_type` contribute nothing, and cause no error: a polymorphic
    /// query states "fields that apply only to type X" this way.
    pub fn collect(
        &self,
        concrete_type: &TypeDefinition,
        selection_sets: &[&'a Positioned<SelectionSet>],
    ) -> Result<Vec<CollectedField<'a>>, ValidationError> {
        let mut buckets: IndexMap<String, CollectedField<'a>> = IndexMap::new();
        let mut active_fragments: HashSet<Name> = HashSet::new();

        for selection_set in selection_sets {
            self.collect_into(
                concrete_type,
                selection_set,
                &mut buckets,
                &mut active_fragments,
            )?;
        }

        Ok(buckets.into_values().collect())
    }

    fn collect_into(
        &self,
        concrete_type: &TypeDefinition,
        selection_set: &'a Positioned<SelectionSet>,
        buckets: &mut IndexMap<String, CollectedField<'a>>,
        active_fragments: &mut HashSet<Name>,
    ) -> Result<(), ValidationError> {
        for selection in &selection_set.node.items {
            match &selection.node {
                Selection::Field(field) => {
                    if !self.directives_allow(&field.node.directives)? {
                        continue;
                    }

                    if field.node.name.node.as_str() == TYPENAME_FIELD {
                        self.validate_typename_field(field)?;
                    }

                    let output_name = field
                        .node
                        .alias
                        .as_ref()
                        .map(|alias| alias.node.to_string())
                        .unwrap_or_else(|| field.node.name.node.to_string());

                    match buckets.get_mut(&output_name) {
                        Some(bucket) => bucket.merged.push(field),
                        None => {
                            buckets.insert(
                                output_name.clone(),
                                CollectedField {
                                    output_name,
                                    field,
                                    merged: vec![field],
                                },
                            );
                        }
                    }
                }
                Selection::FragmentSpread(fragment_spread) => {
                    if !self.directives_allow(&fragment_spread.node.directives)? {
                        continue;
                    }

                    let fragment_name = &fragment_spread.node.fragment_name.node;
                    let fragment_definition = self
                        .fragment_definitions
                        .get(fragment_name)
                        .map(|fragment| &fragment.node)
                        .ok_or_else(|| {
                            ValidationError::FragmentDefinitionNotFound(
                                fragment_name.to_string(),
                                fragment_spread.pos,
                            )
                        })?;

                    if !self.type_condition_matches(
                        concrete_type,
                        fragment_definition.type_condition.node.on.node.as_str(),
                    ) {
                        continue;
                    }

                    if !active_fragments.insert(fragment_name.clone()) {
                        return Err(ValidationError::FragmentCycle(
                            fragment_name.to_string(),
                            fragment_spread.pos,
                        ));
                    }
                    self.collect_into(
                        concrete_type,
                        &fragment_definition.selection_set,
                        buckets,
                        active_fragments,
                    )?;
                    active_fragments.remove(fragment_name);
                }
                Selection::InlineFragment(inline_fragment) => {
                    if !self.directives_allow(&inline_fragment.node.directives)? {
                        continue;
                    }

                    let matches = match &inline_fragment.node.type_condition {
                        Some(type_condition) => self.type_condition_matches(
                            concrete_type,
                            type_condition.node.on.node.as_str(),
                        ),
                        None => true,
                    };

                    if matches {
                        self.collect_into(
                            concrete_type,
                            &inline_fragment.node.selection_set,
                            buckets,
                            active_fragments,
                        )?;
                    }
                }
            }
        }

        Ok(())
    }

    /// A type condition matches when it names the concrete type itself or an
    /// abstract type the concrete type is a possible type of.
    fn type_condition_matches(&self, concrete_type: &TypeDefinition, condition: &str) -> bool {
        concrete_type.name() == condition
            || self
                .schema
                .registry()
                .is_possible_type(condition, concrete_type.name())
    }

    /// Resolve a field's arguments against the operation variables, filling
    /// in declared defaults for arguments the query leaves out.
    pub fn resolve_arguments(
        &self,
        field: &Field,
        field_definition: &FieldDefinition,
    ) -> Result<Map<String, Value>, ValidationError> {
        let mut arguments = Map::new();

        for (name, value) in &field.arguments {
            let const_value = value
                .node
                .clone()
                .into_const_with(|variable_name| self.variable(variable_name, value.pos))?;
            let json_value = const_value.into_json().map_err(|e| {
                ValidationError::MalformedArgument(name.node.to_string(), value.pos, e)
            })?;
            arguments.insert(name.node.to_string(), json_value);
        }

        for declared in &field_definition.arguments {
            let argument_name = declared.node.name.node.as_str();
            if !arguments.contains_key(argument_name) {
                if let Some(default_value) = &declared.node.default_value {
                    let json_value = default_value.node.clone().into_json().map_err(|e| {
                        ValidationError::MalformedArgument(
                            argument_name.to_string(),
                            declared.pos,
                            e,
                        )
                    })?;
                    arguments.insert(argument_name.to_string(), json_value);
                }
            }
        }

        Ok(arguments)
    }

    fn variable(&self, name: Name, pos: Pos) -> Result<ConstValue, ValidationError> {
        self.variables
            .get(&name)
            .cloned()
            .ok_or_else(|| ValidationError::VariableNotFound(name.to_string(), pos))
    }

    /// `@skip` / `@include`, evaluated against the operation variables.
    /// Other directives are not interpreted by the execution engine.
    fn directives_allow(
        &self,
        directives: &[Positioned<Directive>],
    ) -> Result<bool, ValidationError> {
        for directive in directives {
            let include = match directive.node.name.node.as_str() {
                "include" => true,
                "skip" => false,
                _ => continue,
            };

            if self.directive_condition(directive)? != include {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn directive_condition(
        &self,
        directive: &Positioned<Directive>,
    ) -> Result<bool, ValidationError> {
        let malformed = || {
            ValidationError::MalformedDirective(
                directive.node.name.node.to_string(),
                directive.pos,
            )
        };

        let condition = directive.node.get_argument("if").ok_or_else(|| malformed())?;
        let condition = condition
            .node
            .clone()
            .into_const_with(|variable_name| self.variable(variable_name, directive.pos))?;

        match condition {
            ConstValue::Boolean(value) => Ok(value),
            _ => Err(malformed()),
        }
    }

    /// `__typename` is a builtin; it takes no arguments and has no
    /// sub-selection.
    fn validate_typename_field(&self, field: &Positioned<Field>) -> Result<(), ValidationError> {
        if !field.node.arguments.is_empty() {
            Err(ValidationError::StrayArguments(
                field
                    .node
                    .arguments
                    .iter()
                    .map(|arg| arg.0.node.to_string())
                    .collect(),
                field.node.name.to_string(),
                field.pos,
            ))
        } else if !field.node.selection_set.node.items.is_empty() {
            Err(ValidationError::ScalarWithField(
                field.node.name.to_string(),
                field.pos,
            ))
        } else {
            Ok(())
        }
    }
}
