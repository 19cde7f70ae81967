// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use async_graphql_parser::types::{ExecutableDocument, OperationType};
use serde_json::{Map, Value as JsonValue};
use tracing::instrument;

use engine_model::Schema;

use crate::execution_context::{ExecutionContext, ExecutionOptions};
use crate::field_executor::FieldExecutor;
use crate::query_response::{GraphQLError, QueryResponse};
use crate::validation::document_validator::DocumentValidator;
use crate::validation::validation_error::ValidationError;

/// The top-level executor.
///
/// Validates the incoming document, then drives the field executor over the
/// root selection set and assembles the response envelope. The schema is
/// read-only here, so one executor serves any number of concurrent requests.
pub struct GraphQLExecutor {
    schema: Arc<Schema>,
}

impl GraphQLExecutor {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Resolve the provided query document against the supplied root value,
    /// returning a well-formed `data`/`errors` envelope even under partial
    /// failure. `data` is `null` only when the document is rejected before
    /// execution or when a non-null failure bubbled to the root; otherwise
    /// it holds the (possibly partial) result tree alongside any collected
    /// errors.
    #[instrument(
        name = "GraphQLExecutor::resolve_operations"
        skip_all
        )]
    pub async fn resolve_operations(
        &self,
        document: ExecutableDocument,
        operation_name: Option<String>,
        variables: Option<Map<String, JsonValue>>,
        root_value: JsonValue,
        options: ExecutionOptions,
    ) -> QueryResponse {
        let validator = DocumentValidator::new(&self.schema, operation_name, variables);

        let (operation, fragment_definitions) = match validator.validate(document) {
            Ok(validated) => validated,
            Err(error) => {
                tracing::error!(%error, "Rejected query document");
                return Self::request_error(error);
            }
        };

        let root_type = match operation.typ {
            OperationType::Query => Some(self.schema.query_type()),
            OperationType::Mutation => self.schema.mutation_type(),
            OperationType::Subscription => None,
        };
        let Some(root_type) = root_type else {
            // the operation validator rejects operations the schema cannot
            // serve, so this arm is only reachable through it
            let unsupported = match operation.typ {
                OperationType::Mutation => "mutation",
                _ => "subscription",
            };
            return Self::request_error(ValidationError::UnsupportedOperation(unsupported));
        };

        let ctx = ExecutionContext::new(
            &self.schema,
            &fragment_definitions,
            &operation.variables,
            options,
        );
        let executor = FieldExecutor::new(&ctx);

        // mutation root fields run one after another; everything else fans out
        let sequential = operation.typ == OperationType::Mutation;

        let data = match executor
            .execute_selection_set(
                root_type,
                vec![&operation.selection_set],
                &root_value,
                &[],
                sequential,
            )
            .await
        {
            Ok(object) => Some(JsonValue::Object(object)),
            Err(_) => None,
        };

        QueryResponse {
            data,
            errors: ctx.take_errors(),
        }
    }

    fn request_error(error: ValidationError) -> QueryResponse {
        QueryResponse {
            data: None,
            errors: vec![GraphQLError {
                message: error.to_string(),
                path: vec![],
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;
    use std::time::Duration;

    use async_graphql_parser::parse_query;
    use futures::FutureExt;
    use serde_json::json;

    use engine_model::definition::{
        create_field, interface_type_definition, object_type_definition,
    };
    use engine_model::{FieldResolverFn, ResolverError, SchemaBuilder, TypeResolverFn};

    use crate::query_response::PathSegment;

    fn root_passthrough() -> FieldResolverFn {
        Arc::new(|params| {
            let root = params.parent_value.clone();
            async move { Ok(root) }.boxed()
        })
    }

    fn tag_discriminant() -> TypeResolverFn {
        Arc::new(|value| match value.get("type").and_then(JsonValue::as_str) {
            Some("String") => Some("StringTag".to_owned()),
            Some("Int") => Some("IntegerTag".to_owned()),
            _ => None,
        })
    }

    /// The `Tag` schema: an interface with two concrete types discriminated
    /// by the `type` property of the runtime value.
    fn tag_schema() -> Schema {
        let mut builder = SchemaBuilder::new();
        builder
            .register(interface_type_definition(
                "Tag",
                Some("A resource which points to a value"),
                vec![create_field(
                    "alias",
                    "ID",
                    Some("the unique alias of the tag"),
                    vec![],
                )],
            ))
            .unwrap();
        builder
            .register(object_type_definition(
                "StringTag",
                None,
                vec!["Tag"],
                vec![
                    create_field("alias", "ID", Some("the unique alias of the tag"), vec![]),
                    create_field("value", "String", None, vec![]),
                ],
            ))
            .unwrap();
        builder
            .register(object_type_definition(
                "IntegerTag",
                None,
                vec!["Tag"],
                vec![
                    create_field("alias", "ID", Some("the unique alias of the tag"), vec![]),
                    create_field("value", "Int", None, vec![]),
                ],
            ))
            .unwrap();
        builder
            .register(object_type_definition(
                "Query",
                None,
                vec![],
                vec![
                    create_field("allTags", "[Tag!]", None, vec![]),
                    create_field("maybeTags", "[Tag]", None, vec![]),
                ],
            ))
            .unwrap();
        builder.query("Query");
        builder.field_resolver("Query", "allTags", root_passthrough());
        builder.field_resolver("Query", "maybeTags", root_passthrough());
        builder.type_resolver("Tag", tag_discriminant());
        builder.build().unwrap()
    }

    fn tag_root() -> JsonValue {
        json!([
            { "alias": "one", "type": "String", "value": "A Name" },
            { "alias": "two", "type": "Int", "value": 123 }
        ])
    }

    async fn execute(schema: Schema, query: &str, root_value: JsonValue) -> QueryResponse {
        execute_with(schema, query, root_value, ExecutionOptions::default()).await
    }

    async fn execute_with(
        schema: Schema,
        query: &str,
        root_value: JsonValue,
        options: ExecutionOptions,
    ) -> QueryResponse {
        let executor = GraphQLExecutor::new(Arc::new(schema));
        executor
            .resolve_operations(parse_query(query).unwrap(), None, None, root_value, options)
            .await
    }

    fn data_string(response: &QueryResponse) -> String {
        serde_json::to_string(&response.data).unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn resolve_type_works() {
        let response = execute(
            tag_schema(),
            r#"
            {
                allTags {
                    __typename
                    alias
                    ... on StringTag {
                        value
                    }
                    ... on IntegerTag {
                        value
                    }
                }
            }"#,
            tag_root(),
        )
        .await;

        assert!(response.errors.is_empty());
        assert_eq!(
            data_string(&response),
            r#"{"allTags":[{"__typename":"StringTag","alias":"one","value":"A Name"},{"__typename":"IntegerTag","alias":"two","value":123}]}"#
        );
    }

    #[test_log::test(tokio::test)]
    async fn repeated_execution_is_deterministic() {
        let query = r#"
            {
                allTags {
                    __typename
                    alias
                    ... on IntegerTag { value }
                }
            }"#;

        let first = execute(tag_schema(), query, tag_root()).await;
        let second = execute(tag_schema(), query, tag_root()).await;

        assert_eq!(data_string(&first), data_string(&second));
    }

    #[test_log::test(tokio::test)]
    async fn unmatched_discriminant_bubbles_through_non_null_element() {
        let root = json!([
            { "alias": "one", "type": "String", "value": "A Name" },
            { "alias": "two", "type": "Binary", "value": null }
        ]);

        let response = execute(tag_schema(), r#"{ allTags { alias } }"#, root).await;

        // `[Tag!]`: the failed element bubbles past the element boundary and
        // nulls the (nullable) list itself
        assert_eq!(data_string(&response), r#"{"allTags":null}"#);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].path,
            vec![PathSegment::from("allTags"), PathSegment::from(1)]
        );
        assert_eq!(
            response.errors[0].message,
            "Could not resolve concrete type for object value as abstract type 'Tag'"
        );
    }

    #[test_log::test(tokio::test)]
    async fn unmatched_discriminant_nulls_only_its_nullable_element() {
        let root = json!([
            { "alias": "one", "type": "String", "value": "A Name" },
            { "alias": "two", "type": "Binary", "value": null }
        ]);

        let response = execute(tag_schema(), r#"{ maybeTags { alias } }"#, root).await;

        // `[Tag]`: the failure is absorbed at the element position, siblings
        // stay populated, and data and errors coexist
        assert_eq!(
            data_string(&response),
            r#"{"maybeTags":[{"alias":"one"},null]}"#
        );
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].path,
            vec![PathSegment::from("maybeTags"), PathSegment::from(1)]
        );
    }

    #[test_log::test(tokio::test)]
    async fn mismatched_fragments_contribute_nothing_without_errors() {
        let response = execute(
            tag_schema(),
            r#"
            {
                allTags {
                    alias
                    ... on IntegerTag { value }
                }
            }"#,
            json!([{ "alias": "one", "type": "String", "value": "A Name" }]),
        )
        .await;

        assert!(response.errors.is_empty());
        assert_eq!(data_string(&response), r#"{"allTags":[{"alias":"one"}]}"#);
    }

    #[test_log::test(tokio::test)]
    async fn field_order_ignores_fragment_declaration_order() {
        let response = execute(
            tag_schema(),
            r#"
            {
                allTags {
                    ...values
                    alias
                }
            }

            fragment values on Tag {
                __typename
            }"#,
            json!([{ "alias": "one", "type": "String", "value": "A Name" }]),
        )
        .await;

        assert_eq!(
            data_string(&response),
            r#"{"allTags":[{"__typename":"StringTag","alias":"one"}]}"#
        );
    }

    fn nested_schema() -> Schema {
        let mut builder = SchemaBuilder::new();
        builder
            .register(object_type_definition(
                "Query",
                None,
                vec![],
                vec![create_field("outer", "Outer", None, vec![])],
            ))
            .unwrap();
        builder
            .register(object_type_definition(
                "Outer",
                None,
                vec![],
                vec![create_field("inner", "Inner!", None, vec![])],
            ))
            .unwrap();
        builder
            .register(object_type_definition(
                "Inner",
                None,
                vec![],
                vec![create_field("name", "String!", None, vec![])],
            ))
            .unwrap();
        builder.query("Query");
        builder.build().unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn non_null_failure_nulls_nearest_nullable_ancestor() {
        let response = execute(
            nested_schema(),
            r#"{ outer { inner { name } } }"#,
            json!({ "outer": { "inner": { "name": null } } }),
        )
        .await;

        // `name` and `inner` are non-null, `outer` is the nullable boundary
        assert_eq!(data_string(&response), r#"{"outer":null}"#);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].message,
            "Cannot return null for non-nullable field 'Inner.name'"
        );
        assert_eq!(
            response.errors[0].path,
            vec![
                PathSegment::from("outer"),
                PathSegment::from("inner"),
                PathSegment::from("name")
            ]
        );
    }

    #[test_log::test(tokio::test)]
    async fn root_level_non_null_failure_nulls_data() {
        let mut builder = SchemaBuilder::new();
        builder
            .register(object_type_definition(
                "Query",
                None,
                vec![],
                vec![create_field("required", "String!", None, vec![])],
            ))
            .unwrap();
        builder.query("Query");
        let schema = builder.build().unwrap();

        let response = execute(schema, r#"{ required }"#, json!({})).await;

        assert_eq!(data_string(&response), "null");
        assert_eq!(response.errors.len(), 1);
    }

    fn failing_schema() -> Schema {
        let mut builder = SchemaBuilder::new();
        builder
            .register(object_type_definition(
                "Query",
                None,
                vec![],
                vec![
                    create_field("broken", "String", None, vec![]),
                    create_field("greeting", "String", None, vec![]),
                ],
            ))
            .unwrap();
        builder.query("Query");
        builder.field_resolver(
            "Query",
            "broken",
            Arc::new(|_| async { Err(ResolverError::new("connection refused")) }.boxed()),
        );
        builder.build().unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn resolver_failure_is_masked_unless_exposed() {
        let root = json!({ "greeting": "hello" });

        let masked = execute(failing_schema(), r#"{ broken greeting }"#, root.clone()).await;
        assert_eq!(
            data_string(&masked),
            r#"{"broken":null,"greeting":"hello"}"#
        );
        assert_eq!(masked.errors.len(), 1);
        assert_eq!(masked.errors[0].message, "Internal server error");
        assert_eq!(masked.errors[0].path, vec![PathSegment::from("broken")]);

        let exposed = execute_with(
            failing_schema(),
            r#"{ broken greeting }"#,
            root,
            ExecutionOptions {
                expose_exceptions: true,
                ..Default::default()
            },
        )
        .await;
        assert_eq!(exposed.errors[0].message, "connection refused");
    }

    #[test_log::test(tokio::test)]
    async fn timed_out_field_fails_without_corrupting_siblings() {
        let mut builder = SchemaBuilder::new();
        builder
            .register(object_type_definition(
                "Query",
                None,
                vec![],
                vec![
                    create_field("slow", "String", None, vec![]),
                    create_field("fast", "String", None, vec![]),
                ],
            ))
            .unwrap();
        builder.query("Query");
        builder.field_resolver(
            "Query",
            "slow",
            Arc::new(|_| {
                async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    Ok(json!("late"))
                }
                .boxed()
            }),
        );
        builder.field_resolver(
            "Query",
            "fast",
            Arc::new(|_| async { Ok(json!("ok")) }.boxed()),
        );
        let schema = builder.build().unwrap();

        let response = execute_with(
            schema,
            r#"{ slow fast }"#,
            json!({}),
            ExecutionOptions {
                timeout: Some(Duration::from_millis(50)),
                ..Default::default()
            },
        )
        .await;

        assert_eq!(data_string(&response), r#"{"slow":null,"fast":"ok"}"#);
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "Field resolution timed out");
        assert_eq!(response.errors[0].path, vec![PathSegment::from("slow")]);
    }

    /// Schema whose `first`/`second` resolvers log their completion order:
    /// `first` dawdles, `second` returns immediately.
    fn ordering_schema(log: Arc<Mutex<Vec<&'static str>>>) -> Schema {
        let fields = || {
            vec![
                create_field("first", "String", None, vec![]),
                create_field("second", "String", None, vec![]),
            ]
        };

        let first_log = log.clone();
        let second_log = log;

        let mut builder = SchemaBuilder::new();
        builder
            .register(object_type_definition("Query", None, vec![], fields()))
            .unwrap();
        builder
            .register(object_type_definition("Mutation", None, vec![], fields()))
            .unwrap();
        builder.query("Query");
        builder.mutation("Mutation");

        for type_name in ["Query", "Mutation"] {
            let first_log = first_log.clone();
            let second_log = second_log.clone();
            builder.field_resolver(
                type_name,
                "first",
                Arc::new(move |_| {
                    let log = first_log.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        log.lock().unwrap().push("first");
                        Ok(json!("first"))
                    }
                    .boxed()
                }),
            );
            builder.field_resolver(
                type_name,
                "second",
                Arc::new(move |_| {
                    let log = second_log.clone();
                    async move {
                        log.lock().unwrap().push("second");
                        Ok(json!("second"))
                    }
                    .boxed()
                }),
            );
        }

        builder.build().unwrap()
    }

    #[test_log::test(tokio::test)]
    async fn query_siblings_fan_out_but_keep_document_order() {
        let log = Arc::new(Mutex::new(vec![]));
        let response = execute(ordering_schema(log.clone()), r#"{ first second }"#, json!({}))
            .await;

        // `second` finished first, yet the result tree is in document order
        assert_eq!(*log.lock().unwrap(), ["second", "first"]);
        assert_eq!(
            data_string(&response),
            r#"{"first":"first","second":"second"}"#
        );
    }

    #[test_log::test(tokio::test)]
    async fn mutation_root_fields_run_sequentially() {
        let log = Arc::new(Mutex::new(vec![]));
        let response = execute(
            ordering_schema(log.clone()),
            r#"mutation { first second }"#,
            json!({}),
        )
        .await;

        assert_eq!(*log.lock().unwrap(), ["first", "second"]);
        assert_eq!(
            data_string(&response),
            r#"{"first":"first","second":"second"}"#
        );
    }

    #[test_log::test(tokio::test)]
    async fn rejected_document_reports_null_data() {
        let response = execute(
            tag_schema(),
            r#"
            query a { allTags { alias } }
            query b { allTags { alias } }
            "#,
            tag_root(),
        )
        .await;

        assert_eq!(data_string(&response), "null");
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].message,
            "Must provide operation name if query contains multiple operations"
        );
    }

    #[test_log::test(tokio::test)]
    async fn operation_selected_by_name() {
        let executor = GraphQLExecutor::new(Arc::new(tag_schema()));
        let document = parse_query(
            r#"
            query first { allTags { alias } }
            query second { allTags { __typename } }
            "#,
        )
        .unwrap();

        let response = executor
            .resolve_operations(
                document,
                Some("second".to_string()),
                None,
                json!([{ "alias": "one", "type": "String" }]),
                ExecutionOptions::default(),
            )
            .await;

        assert!(response.errors.is_empty());
        assert_eq!(
            data_string(&response),
            r#"{"allTags":[{"__typename":"StringTag"}]}"#
        );
    }

    #[test_log::test(tokio::test)]
    async fn fragment_cycle_fails_the_spreading_field() {
        let response = execute(
            tag_schema(),
            r#"
            {
                allTags {
                    ...tagInfo
                }
            }

            fragment tagInfo on Tag {
                ...tagInfo
            }"#,
            json!([{ "alias": "one", "type": "String" }]),
        )
        .await;

        // the cycle is detected while collecting inside `allTags`
        assert_eq!(response.errors.len(), 1);
        assert_eq!(
            response.errors[0].message,
            "Fragment 'tagInfo' spreads itself"
        );
    }

    #[test_log::test(tokio::test)]
    async fn variables_flow_into_skip_directives() {
        let executor = GraphQLExecutor::new(Arc::new(tag_schema()));
        let document = parse_query(
            r#"
            query($skipAlias: Boolean!) {
                allTags {
                    alias @skip(if: $skipAlias)
                    __typename
                }
            }"#,
        )
        .unwrap();

        let variables = json!({ "skipAlias": true }).as_object().unwrap().clone();
        let response = executor
            .resolve_operations(
                document,
                None,
                Some(variables),
                json!([{ "alias": "one", "type": "String" }]),
                ExecutionOptions::default(),
            )
            .await;

        assert!(response.errors.is_empty());
        assert_eq!(
            data_string(&response),
            r#"{"allTags":[{"__typename":"StringTag"}]}"#
        );
    }
}
