// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::Serialize;
use serde_json::Value as JsonValue;

/// One step from the root of the result tree: a response key or a list
/// index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

pub type ResponsePath = Vec<PathSegment>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphQLError {
    pub message: String,
    pub path: ResponsePath,
}

/// The response envelope: `data` and `errors` are both always present, and a
/// response may carry both at once under partial failure. `data` is `null`
/// only when execution never started (a rejected document) or when a
/// non-null failure bubbled all the way to the root.
#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub data: Option<JsonValue>,
    pub errors: Vec<GraphQLError>,
}

impl QueryResponse {
    pub fn to_json(&self) -> Result<JsonValue, serde_json::Error> {
        serde_json::to_value(self)
    }
}
