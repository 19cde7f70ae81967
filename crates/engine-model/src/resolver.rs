// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::{Map, Value};
use thiserror::Error;

/// What a field resolver sees: the parent's resolved value (the caller's
/// root value for root fields) and the field arguments with variables
/// already substituted.
#[derive(Debug)]
pub struct ResolverParams<'a> {
    pub parent_value: &'a Value,
    pub arguments: &'a Map<String, Value>,
}

/// A field resolver bound to a single field at schema-build time.
pub type FieldResolverFn =
    Arc<dyn for<'a> Fn(ResolverParams<'a>) -> BoxFuture<'a, Result<Value, ResolverError>> + Send + Sync>;

/// A type resolver bound to an interface or union at schema-build time.
///
/// Inspects a runtime value and names the concrete object type it
/// represents; `None` when the value matches no possible type. Must be a
/// pure function of the value, so repeated resolution within one response
/// is stable.
pub type TypeResolverFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Failure reported by a field resolver. The execution engine records it
/// against the field's response path; whether the detail here reaches the
/// client depends on the exposure setting of the request.
#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("{0}")]
    Message(String),

    #[error("{0}")]
    Delegate(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl ResolverError {
    pub fn new(message: impl Into<String>) -> Self {
        ResolverError::Message(message.into())
    }
}

/// The resolver applied to fields with no explicit binding: look the field
/// up as a property of the parent object, absent properties resolving to
/// null.
pub fn default_resolve(parent_value: &Value, field_name: &str) -> Value {
    match parent_value {
        Value::Object(object) => object.get(field_name).cloned().unwrap_or(Value::Null),
        _ => Value::Null,
    }
}
