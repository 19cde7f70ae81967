// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

pub mod selection;
pub mod validation;

mod error;
mod execution_context;
mod field_executor;
mod query_response;
mod system_resolver;

pub use error::FieldError;
pub use execution_context::{ExecutionContext, ExecutionOptions};
pub use query_response::{GraphQLError, PathSegment, QueryResponse, ResponsePath};
pub use system_resolver::GraphQLExecutor;
