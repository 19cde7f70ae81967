// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

use engine_model::ResolverError;

use crate::validation::validation_error::ValidationError;

/// A failure scoped to a single field of the result tree. Recorded against
/// the field's response path and converted into a null there; never allowed
/// to unwind past the executor.
#[derive(Error, Debug)]
pub enum FieldError {
    #[error("Could not resolve concrete type for {value_kind} value as abstract type '{abstract_type}'")]
    AbstractTypeResolution {
        abstract_type: String,
        value_kind: String,
    },

    #[error(transparent)]
    FieldResolution(#[from] ResolverError),

    #[error("Cannot return null for non-nullable field '{type_name}.{field_name}'")]
    NullabilityViolation {
        type_name: String,
        field_name: String,
    },

    #[error("Expected a list value for field '{field_name}'")]
    InvalidListValue { field_name: String },

    #[error("Cannot coerce value to scalar type '{type_name}'")]
    ScalarCoercion { type_name: String },

    #[error("Field resolution timed out")]
    Timeout,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl FieldError {
    /// Message that should be emitted when the error is returned to the
    /// user. Resolver failure detail is internal and stays hidden unless the
    /// request asked for exposure.
    pub fn user_error_message(&self, expose_exceptions: bool) -> String {
        match self.explicit_message() {
            Some(message) => message,
            None if expose_exceptions => self.to_string(),
            None => "Internal server error".to_string(),
        }
    }

    pub fn explicit_message(&self) -> Option<String> {
        match self {
            FieldError::FieldResolution(_) => None,
            _ => Some(self.to_string()),
        }
    }
}
