// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use async_graphql_parser::{
    Positioned,
    types::{OperationDefinition, OperationType, VariableDefinition},
};
use async_graphql_value::{ConstValue, Name};
use serde_json::{Map, Value};

use engine_model::Schema;

use super::operation::ValidatedOperation;
use super::validation_error::ValidationError;

/// Context for validating an operation.
pub(super) struct OperationValidator<'a> {
    schema: &'a Schema,
    operation_name: Option<String>,
    variables: Option<Map<String, Value>>,
}

impl<'a> OperationValidator<'a> {
    #[must_use]
    pub(super) fn new(
        schema: &'a Schema,
        operation_name: Option<String>,
        variables: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            schema,
            operation_name,
            variables,
        }
    }

    /// Validate operation. Operation defines a GraphQL top-level operation
    /// such as
    /// ```graphql
    ///    mutation create($name: String!) {
    ///       createName(name: $name) {
    ///          id
    ///       }
    ///    }
    /// ```
    ///
    /// Validations performed:
    /// - The schema supports the operation type (a query root always exists;
    ///   mutations require a mutation root; subscriptions are not supported)
    /// - Each variable in [OperationDefinition::variable_definitions] is
    ///   available (see [`Self::validate_variables`] for details)
    ///
    /// Field-level validation against the schema stays upstream; the
    /// selection set is carried through untouched.
    pub(super) fn validate(
        self,
        operation: Positioned<OperationDefinition>,
    ) -> Result<ValidatedOperation, ValidationError> {
        match operation.node.ty {
            OperationType::Query => {}
            OperationType::Mutation => {
                if self.schema.mutation_type().is_none() {
                    return Err(ValidationError::UnsupportedOperation("mutation"));
                }
            }
            OperationType::Subscription => {
                return Err(ValidationError::UnsupportedOperation("subscription"));
            }
        }

        let variables = self.validate_variables(operation.node.variable_definitions)?;

        Ok(ValidatedOperation {
            name: self.operation_name,
            typ: operation.node.ty,
            variables,
            selection_set: operation.node.selection_set,
        })
    }

    /// Validate variables.
    ///
    /// Validations performed:
    /// - All non-null variables in
    ///   [OperationDefinition::variable_definitions] are supplied by the
    ///   caller or carry a default value
    ///
    /// # Returns
    ///   Resolved variables (note the output type uses `ConstValue` instead
    ///   of `Value` to indicate that the value has been resolved)
    fn validate_variables(
        &self,
        variable_definitions: Vec<Positioned<VariableDefinition>>,
    ) -> Result<HashMap<Name, ConstValue>, ValidationError> {
        variable_definitions
            .into_iter()
            .filter_map(|variable_definition| {
                let variable_name = variable_definition.node.name;

                match self.var_value(&variable_name) {
                    Some(value) => Some(value.map(|value| (variable_name.node, value))),
                    None => match variable_definition.node.default_value {
                        Some(default_value) => {
                            Some(Ok((variable_name.node, default_value.node)))
                        }
                        None if !variable_definition.node.var_type.node.nullable => {
                            Some(Err(ValidationError::VariableNotFound(
                                variable_name.node.to_string(),
                                variable_name.pos,
                            )))
                        }
                        // a nullable variable without a value is simply absent
                        None => None,
                    },
                }
            })
            .collect()
    }

    fn var_value(
        &self,
        name: &Positioned<Name>,
    ) -> Option<Result<ConstValue, ValidationError>> {
        let resolved = self
            .variables
            .as_ref()
            .and_then(|variables| variables.get(name.node.as_str()))?;

        Some(ConstValue::from_json(resolved.to_owned()).map_err(|e| {
            ValidationError::MalformedVariable(name.node.as_str().to_string(), name.pos, e)
        }))
    }
}
