// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

/// Validate the query payload.
///
/// Take a parsed query document along with the operation name and variables
/// (from the request payload) and pick out the operation to execute,
/// resolving its variables in the process. Field-level validation against
/// the schema is an upstream concern.
pub mod operation;

pub mod document_validator;

mod operation_validator;

pub mod validation_error;
