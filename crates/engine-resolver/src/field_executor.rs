// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use async_graphql_parser::Positioned;
use async_graphql_parser::types::{
    BaseType, SelectionSet, Type, TypeDefinition, TypeKind,
};
use async_recursion::async_recursion;
use futures::future::join_all;
use serde_json::{Map, Value as JsonValue};

use engine_model::type_normalization::TypeDefinitionIntrospection;
use engine_model::{ResolverParams, default_resolve};

use crate::error::FieldError;
use crate::execution_context::ExecutionContext;
use crate::query_response::PathSegment;
use crate::selection::{CollectedField, TYPENAME_FIELD};
use crate::validation::validation_error::ValidationError;

/// A failure that has been recorded against its response path and now nulls
/// the nearest enclosing nullable position. Carries no detail: the error
/// entry already exists, bubbling must not add another.
#[derive(Debug)]
pub(crate) struct Bubbled;

pub(crate) type Completion<T> = Result<T, Bubbled>;

/// Resolves one field at a time against a parent value, walking the declared
/// type to coerce the result: non-null enforcement (with bubbling), list
/// elements completed independently, abstract types dispatched through their
/// type resolver, composites recursed into via freshly collected
/// sub-selections.
pub(crate) struct FieldExecutor<'a> {
    ctx: &'a ExecutionContext<'a>,
}

struct FieldOutcome {
    output_name: String,
    nullable: bool,
    value: Completion<JsonValue>,
}

impl<'a> FieldExecutor<'a> {
    pub(crate) fn new(ctx: &'a ExecutionContext<'a>) -> Self {
        Self { ctx }
    }

    /// Execute the (merged) selection sets against one concrete object type.
    /// Sibling fields resolve concurrently (a fan-out with a join barrier,
    /// so one sibling's failure neither cancels nor corrupts the others)
    /// unless `sequential` is set for root mutation fields. The returned map
    /// preserves first-occurrence document order regardless of completion
    /// order.
    #[async_recursion]
    pub(crate) async fn execute_selection_set(
        &self,
        concrete_type: &'a TypeDefinition,
        selection_sets: Vec<&'a Positioned<SelectionSet>>,
        parent_value: &JsonValue,
        path: &[PathSegment],
        sequential: bool,
    ) -> Completion<Map<String, JsonValue>> {
        let collected = match self
            .ctx
            .collector()
            .collect(concrete_type, &selection_sets)
        {
            Ok(collected) => collected,
            Err(error) => {
                self.ctx.record(&FieldError::Validation(error), path);
                return Err(Bubbled);
            }
        };

        let outcomes = if sequential {
            let mut outcomes = Vec::with_capacity(collected.len());
            for field in &collected {
                outcomes.push(
                    self.execute_field(concrete_type, field, parent_value, path)
                        .await,
                );
            }
            outcomes
        } else {
            join_all(
                collected
                    .iter()
                    .map(|field| self.execute_field(concrete_type, field, parent_value, path)),
            )
            .await
        };

        let mut result = Map::new();
        for outcome in outcomes {
            match outcome.value {
                Ok(value) => {
                    result.insert(outcome.output_name, value);
                }
                Err(Bubbled) if outcome.nullable => {
                    result.insert(outcome.output_name, JsonValue::Null);
                }
                Err(Bubbled) => return Err(Bubbled),
            }
        }

        Ok(result)
    }

    async fn execute_field(
        &self,
        parent_type: &'a TypeDefinition,
        field: &CollectedField<'a>,
        parent_value: &JsonValue,
        path: &[PathSegment],
    ) -> FieldOutcome {
        let mut field_path = path.to_vec();
        field_path.push(PathSegment::Key(field.output_name.clone()));

        if field.name() == TYPENAME_FIELD {
            return FieldOutcome {
                output_name: field.output_name.clone(),
                nullable: false,
                value: Ok(JsonValue::String(parent_type.name().to_owned())),
            };
        }

        let Some(field_definition) = parent_type.field_definition(field.name()) else {
            let error = FieldError::Validation(ValidationError::InvalidField(
                field.name().to_owned(),
                parent_type.name().to_owned(),
                field.pos(),
            ));
            self.ctx.record(&error, &field_path);
            return FieldOutcome {
                output_name: field.output_name.clone(),
                nullable: true,
                value: Err(Bubbled),
            };
        };

        let nullable = field_definition.ty.node.nullable;

        let arguments = match self
            .ctx
            .collector()
            .resolve_arguments(&field.field.node, field_definition)
        {
            Ok(arguments) => arguments,
            Err(error) => {
                self.ctx.record(&FieldError::Validation(error), &field_path);
                return FieldOutcome {
                    output_name: field.output_name.clone(),
                    nullable,
                    value: Err(Bubbled),
                };
            }
        };

        let value = match self
            .resolve_field_value(parent_type, field, &arguments, parent_value)
            .await
        {
            Ok(value) => {
                self.complete_value(
                    &field_definition.ty.node,
                    field,
                    parent_type.name(),
                    value,
                    &field_path,
                )
                .await
            }
            Err(error) => {
                self.ctx.record(&error, &field_path);
                Err(Bubbled)
            }
        };

        FieldOutcome {
            output_name: field.output_name.clone(),
            nullable,
            value,
        }
    }

    /// Invoke the field's bound resolver, or fall back to property lookup on
    /// the parent value. A resolver still pending at the request deadline is
    /// abandoned and reported as timed out.
    async fn resolve_field_value(
        &self,
        parent_type: &'a TypeDefinition,
        field: &CollectedField<'a>,
        arguments: &Map<String, JsonValue>,
        parent_value: &JsonValue,
    ) -> Result<JsonValue, FieldError> {
        match self
            .ctx
            .schema()
            .field_resolver(parent_type.name(), field.name())
        {
            Some(resolver) => {
                let resolution = resolver(ResolverParams {
                    parent_value,
                    arguments,
                });

                let resolved = match self.ctx.deadline() {
                    Some(deadline) => tokio::time::timeout_at(deadline, resolution)
                        .await
                        .map_err(|_| FieldError::Timeout)?,
                    None => resolution.await,
                };

                resolved.map_err(FieldError::FieldResolution)
            }
            None => Ok(default_resolve(parent_value, field.name())),
        }
    }

    /// Coerce a resolved value against the field's declared type, recursing
    /// into sub-selections for composite types.
    #[async_recursion]
    async fn complete_value(
        &self,
        ty: &'a Type,
        field: &CollectedField<'a>,
        parent_type_name: &str,
        value: JsonValue,
        path: &[PathSegment],
    ) -> Completion<JsonValue> {
        if value.is_null() {
            if ty.nullable {
                return Ok(JsonValue::Null);
            }
            let error = FieldError::NullabilityViolation {
                type_name: parent_type_name.to_owned(),
                field_name: field.name().to_owned(),
            };
            self.ctx.record(&error, path);
            return Err(Bubbled);
        }

        match &ty.base {
            BaseType::List(element_type) => {
                let JsonValue::Array(items) = value else {
                    let error = FieldError::InvalidListValue {
                        field_name: field.name().to_owned(),
                    };
                    self.ctx.record(&error, path);
                    return Err(Bubbled);
                };

                let completions = join_all(items.into_iter().enumerate().map(
                    |(index, item)| async move {
                        let mut item_path = path.to_vec();
                        item_path.push(PathSegment::Index(index));
                        self.complete_value(element_type, field, parent_type_name, item, &item_path)
                            .await
                    },
                ))
                .await;

                let mut elements = Vec::with_capacity(completions.len());
                for completion in completions {
                    match completion {
                        Ok(element) => elements.push(element),
                        Err(Bubbled) if element_type.nullable => {
                            elements.push(JsonValue::Null)
                        }
                        Err(Bubbled) => return Err(Bubbled),
                    }
                }

                Ok(JsonValue::Array(elements))
            }
            BaseType::Named(type_name) => {
                let Some(type_definition) =
                    self.ctx.schema().get_type_definition(type_name.as_str())
                else {
                    let error = FieldError::Validation(ValidationError::InvalidFieldType(
                        type_name.to_string(),
                        field.pos(),
                    ));
                    self.ctx.record(&error, path);
                    return Err(Bubbled);
                };

                match &type_definition.kind {
                    TypeKind::Scalar | TypeKind::Enum(_) => {
                        self.complete_scalar(type_definition.name(), value, path)
                    }
                    TypeKind::Object(_) => {
                        let object = self
                            .execute_selection_set(
                                type_definition,
                                field.selection_sets(),
                                &value,
                                path,
                                false,
                            )
                            .await?;
                        Ok(JsonValue::Object(object))
                    }
                    TypeKind::Interface(_) | TypeKind::Union(_) => {
                        let concrete_type =
                            self.resolve_concrete_type(type_definition, &value, path)?;
                        let object = self
                            .execute_selection_set(
                                concrete_type,
                                field.selection_sets(),
                                &value,
                                path,
                                false,
                            )
                            .await?;
                        Ok(JsonValue::Object(object))
                    }
                    TypeKind::InputObject(_) => {
                        let error = FieldError::Validation(ValidationError::InvalidFieldType(
                            type_name.to_string(),
                            field.pos(),
                        ));
                        self.ctx.record(&error, path);
                        Err(Bubbled)
                    }
                }
            }
        }
    }

    /// Dispatch an abstract (interface/union) type to the concrete object
    /// type the runtime value represents. The bound type resolver names the
    /// type; the name must be a member of the abstract type's possible
    /// types.
    fn resolve_concrete_type(
        &self,
        abstract_type: &'a TypeDefinition,
        value: &JsonValue,
        path: &[PathSegment],
    ) -> Completion<&'a TypeDefinition> {
        let resolved = self
            .ctx
            .schema()
            .type_resolver(abstract_type.name())
            .and_then(|resolve| resolve(value));

        let concrete_type = resolved
            .filter(|name| {
                self.ctx
                    .schema()
                    .registry()
                    .is_possible_type(abstract_type.name(), name)
            })
            .and_then(|name| self.ctx.schema().get_type_definition(&name));

        match concrete_type {
            Some(concrete_type) => Ok(concrete_type),
            None => {
                let error = FieldError::AbstractTypeResolution {
                    abstract_type: abstract_type.name().to_owned(),
                    value_kind: json_kind(value).to_owned(),
                };
                self.ctx.record(&error, path);
                Err(Bubbled)
            }
        }
    }

    /// Scalars pass through in their serialized JSON form once their shape
    /// matches the declared type. `ID` additionally accepts numbers,
    /// serializing them as string literals.
    fn complete_scalar(
        &self,
        type_name: &str,
        value: JsonValue,
        path: &[PathSegment],
    ) -> Completion<JsonValue> {
        let shape_matches = match type_name {
            "Int" => value.as_i64().is_some() || value.as_u64().is_some(),
            "Float" => value.is_number(),
            "String" => value.is_string(),
            "Boolean" => value.is_boolean(),
            "ID" => value.is_string() || value.is_number(),
            _ => true, // custom scalars serialize as-is
        };

        if !shape_matches {
            let error = FieldError::ScalarCoercion {
                type_name: type_name.to_owned(),
            };
            self.ctx.record(&error, path);
            return Err(Bubbled);
        }

        if type_name == "ID" && value.is_number() {
            return Ok(JsonValue::String(value.to_string()));
        }

        Ok(value)
    }
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
