// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_graphql_parser::Positioned;
use async_graphql_parser::types::FragmentDefinition;
use async_graphql_value::{ConstValue, Name};
use tokio::time::Instant;

use engine_model::Schema;

use crate::error::FieldError;
use crate::query_response::{GraphQLError, PathSegment};
use crate::selection::SelectionCollector;

/// Per-request execution settings, supplied by the caller alongside the root
/// value.
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Include resolver failure detail verbatim in error messages instead of
    /// the generic substitute.
    pub expose_exceptions: bool,
    /// Deadline for the whole request; a resolver still in flight when it
    /// elapses fails with a timeout error at its own path.
    pub timeout: Option<Duration>,
}

/// State owned by a single query execution: the collector over the
/// document's fragments and variables, the request options, and the error
/// sink. Never shared across requests; the error sink is the only part that
/// needs synchronization, and only across this request's own concurrent
/// field executions.
pub struct ExecutionContext<'a> {
    schema: &'a Schema,
    collector: SelectionCollector<'a>,
    options: ExecutionOptions,
    deadline: Option<Instant>,
    errors: Mutex<Vec<GraphQLError>>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        schema: &'a Schema,
        fragment_definitions: &'a HashMap<Name, Positioned<FragmentDefinition>>,
        variables: &'a HashMap<Name, ConstValue>,
        options: ExecutionOptions,
    ) -> Self {
        let deadline = options.timeout.map(|timeout| Instant::now() + timeout);

        Self {
            schema,
            collector: SelectionCollector::new(schema, fragment_definitions, variables),
            options,
            deadline,
            errors: Mutex::new(vec![]),
        }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn collector(&self) -> &SelectionCollector<'a> {
        &self.collector
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Record a field-scoped error at its response path. The message is
    /// rendered here so exposure masking applies uniformly.
    pub fn record(&self, error: &FieldError, path: &[PathSegment]) {
        tracing::warn!(%error, ?path, "Field resolution failed");

        self.errors.lock().unwrap().push(GraphQLError {
            message: error.user_error_message(self.options.expose_exceptions),
            path: path.to_vec(),
        });
    }

    pub fn take_errors(&self) -> Vec<GraphQLError> {
        std::mem::take(&mut *self.errors.lock().unwrap())
    }
}
