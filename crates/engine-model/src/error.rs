// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

/// Schema construction failures. All of these are fatal: a schema that fails
/// to build never reaches execution.
#[derive(Error, Debug)]
pub enum SchemaBuildError {
    #[error("Type '{0}' is already registered")]
    DuplicateType(String),

    #[error("Type '{name}' referenced by '{referenced_by}' is not registered")]
    UnknownType { name: String, referenced_by: String },

    #[error("No query root type was set")]
    MissingQueryRoot,

    #[error("Root type '{0}' must be an object type")]
    InvalidRootType(String),

    #[error("Field '{type_name}.{field_name}' has no definition to attach a resolver to")]
    UnknownField {
        type_name: String,
        field_name: String,
    },

    #[error("Abstract type '{0}' has no type resolver")]
    MissingTypeResolver(String),

    #[error("Type '{0}' is not an interface or union, so it cannot have a type resolver")]
    NotAbstractType(String),

    #[error(
        "Type '{object}' does not declare field '{field}' compatibly with interface '{interface}'"
    )]
    IncompatibleInterfaceField {
        interface: String,
        object: String,
        field: String,
    },

    #[error("Union '{union}' member '{member}' is not an object type")]
    NonObjectUnionMember { union: String, member: String },
}
