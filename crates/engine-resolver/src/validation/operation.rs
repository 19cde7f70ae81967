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
    types::{OperationType, SelectionSet},
};
use async_graphql_value::{ConstValue, Name};

/// The operation picked out of a query document, with its variables resolved
/// against the caller-supplied values.
///
/// The selection set is kept in raw form: which fragments apply to which
/// values can only be decided per concrete type during execution.
#[derive(Debug)]
pub struct ValidatedOperation {
    pub name: Option<String>,
    /// The type of operation.
    pub typ: OperationType,
    pub variables: HashMap<Name, ConstValue>,
    pub selection_set: Positioned<SelectionSet>,
}
