//! Built-in Resource Scenarios
//!
//! End-to-end checks of each built-in resource through the public pipeline.

use resourceforge_core::resources::{
    api_gateway_domain, iotanalytics_dataset, iotanalytics_pipeline, medialive_channel,
    notification_rule, sqs_queue,
};
use resourceforge_core::{
    builtin_catalog, ConstraintKind, PipelineError, Scalar, SynthesisPipeline, ValidationError,
};
use serde_json::{json, Value};

fn create_pipeline() -> SynthesisPipeline {
    SynthesisPipeline::new(builtin_catalog().unwrap())
}

fn validation_error(result: Result<impl std::fmt::Debug, PipelineError>) -> ValidationError {
    match result {
        Err(PipelineError::Validation(cause)) => cause,
        other => panic!("expected a validation error, got {other:?}"),
    }
}

fn rule_of(error: &ValidationError) -> &str {
    match error.leaf() {
        ValidationError::CrossFieldViolation { rule, .. } => rule,
        other => panic!("expected a cross-field violation, got {other:?}"),
    }
}

// --- aws_sqs_queue ---

#[test]
fn test_queue_fifo_rules() {
    let pipeline = create_pipeline();

    let fifo = pipeline
        .synthesize(
            sqs_queue::RESOURCE_TYPE,
            "orders",
            &json!({"name": "orders.fifo", "fifo_queue": true, "content_based_deduplication": true}),
        )
        .unwrap();
    assert_eq!(fifo.references.computed("is_fifo"), Some(&Scalar::Bool(true)));
    assert_eq!(fifo.references.computed("has_dead_letter_queue"), Some(&Scalar::Bool(false)));

    let missing_suffix = pipeline.validate(sqs_queue::RESOURCE_TYPE, &json!({"name": "orders", "fifo_queue": true}));
    assert_eq!(rule_of(&validation_error(missing_suffix)), "fifo_name_suffix");

    let dedup = pipeline.validate(sqs_queue::RESOURCE_TYPE, &json!({"content_based_deduplication": true}));
    assert_eq!(
        rule_of(&validation_error(dedup)),
        "content_based_deduplication_requires_fifo"
    );
}

#[test]
fn test_queue_keys_are_normalized() {
    let pipeline = create_pipeline();

    let record = pipeline
        .validate(
            sqs_queue::RESOURCE_TYPE,
            &json!({"DelaySeconds": 5, ":receive_wait_time_seconds": 10, "visibility-timeout-seconds": 45}),
        )
        .unwrap();
    assert_eq!(record.i64("delay_seconds"), Some(5));
    assert_eq!(record.i64("receive_wait_time_seconds"), Some(10));
    assert_eq!(record.i64("visibility_timeout_seconds"), Some(45));

    // case-insensitive: a key differing from the field only in letter case
    // must still land on that field, never fall back to the default
    for key in ["DELAY_SECONDS", "deLay_seconds", "dELAY_SECONDS", "Delay-Seconds"] {
        let mut raw = serde_json::Map::new();
        raw.insert(key.to_string(), json!(5));
        let record = pipeline.validate(sqs_queue::RESOURCE_TYPE, &Value::Object(raw)).unwrap();
        assert_eq!(record.i64("delay_seconds"), Some(5), "key {key}");
    }

    let clash = pipeline.validate(sqs_queue::RESOURCE_TYPE, &json!({"delay_seconds": 1, "DelaySeconds": 2}));
    assert_eq!(
        validation_error(clash),
        ValidationError::DuplicateField { field: "delay_seconds".to_string() }
    );
}

#[test]
fn test_queue_fifo_flag_accepts_token() {
    let pipeline = create_pipeline();
    let token = "${aws_sqs_queue.src.fifo_queue}";

    let synthesized = pipeline
        .synthesize(sqs_queue::RESOURCE_TYPE, "mirror", &json!({"name": "orders.fifo", "fifo_queue": token}))
        .unwrap();
    assert_eq!(synthesized.references.computed("is_fifo"), Some(&Scalar::from(token)));
    assert_eq!(synthesized.block.scalar("fifoQueue"), Some(&Scalar::from(token)));

    let dedup = pipeline.validate(
        sqs_queue::RESOURCE_TYPE,
        &json!({"name": "orders", "fifo_queue": token, "content_based_deduplication": true}),
    );
    assert!(dedup.is_ok(), "{dedup:?}");
}

#[test]
fn test_queue_null_counts_as_absent() {
    let pipeline = create_pipeline();
    let record = pipeline
        .validate(sqs_queue::RESOURCE_TYPE, &json!({"delay_seconds": null, "name": null}))
        .unwrap();
    assert_eq!(record.i64("delay_seconds"), Some(0));
    assert!(!record.contains("name"));
}

#[test]
fn test_queue_redrive_policy_is_strict() {
    let pipeline = create_pipeline();
    let raw = json!({
        "redrive_policy": {
            "dead_letter_target_arn": "arn:aws:sqs:us-east-1:123456789012:dlq",
            "max_receive_count": 5,
            "max_retries": 5
        }
    });

    let cause = validation_error(pipeline.validate(sqs_queue::RESOURCE_TYPE, &raw));
    assert_eq!(cause.path(), "redrive_policy.max_retries");
    assert!(matches!(cause.leaf(), ValidationError::UnknownField { .. }));
}

#[test]
fn test_reference_tokens_wire_into_other_resources() {
    let pipeline = create_pipeline();

    let dlq = pipeline
        .synthesize(sqs_queue::RESOURCE_TYPE, "dead_letters", &json!({"name": "dead-letters"}))
        .unwrap();
    let dlq_arn = dlq.references.output("arn").unwrap().to_string();
    assert_eq!(dlq_arn, "${aws_sqs_queue.dead_letters.arn}");

    let queue = pipeline
        .synthesize(
            sqs_queue::RESOURCE_TYPE,
            "orders",
            &json!({
                "name": "orders",
                "redrive_policy": {"dead_letter_target_arn": dlq_arn, "max_receive_count": 4}
            }),
        )
        .unwrap();
    let redrive = queue.block.node("redrivePolicy").unwrap();
    assert_eq!(
        redrive.scalar("deadLetterTargetArn"),
        Some(&Scalar::String("${aws_sqs_queue.dead_letters.arn}".to_string()))
    );
    assert_eq!(queue.references.computed("has_dead_letter_queue"), Some(&Scalar::Bool(true)));

    // the same token satisfies any ARN-typed field
    let rule = pipeline.validate(
        notification_rule::RESOURCE_TYPE,
        &json!({
            "name": "queue alerts",
            "detail_type": "BASIC",
            "event_type_ids": ["codecommit-repository-comments-on-commits"],
            "resource": "arn:aws:codecommit:us-east-1:123456789012:app",
            "targets": [{"address": queue.references.output("arn").unwrap()}]
        }),
    );
    assert!(rule.is_ok(), "{rule:?}");
}

// --- aws_iotanalytics_dataset ---

fn dataset(action: Value) -> Value {
    json!({"dataset_name": "daily_report", "actions": [action]})
}

#[test]
fn test_dataset_block_shape() {
    let pipeline = create_pipeline();
    let raw = json!({
        "dataset_name": "daily_report",
        "actions": [{
            "action_name": "summarize",
            "query_action": {
                "sql_query": "select * from telemetry",
                "filters": [{"delta_time": {"offset_seconds": -60, "time_expression": "from_unixtime(ts)"}}]
            }
        }],
        "triggers": [{"triggering_dataset": {"name": "hourly"}}],
        "retention_period": {"number_of_days": 30}
    });

    let synthesized = pipeline
        .synthesize(iotanalytics_dataset::RESOURCE_TYPE, "report", &raw)
        .unwrap();
    assert_eq!(
        synthesized.block.to_json(),
        json!({
            "datasetName": "daily_report",
            "actions": [{
                "actionName": "summarize",
                "queryAction": {
                    "sqlQuery": "select * from telemetry",
                    "filters": [{"deltaTime": {"offsetSeconds": -60, "timeExpression": "from_unixtime(ts)"}}]
                }
            }],
            "triggers": [{"triggeringDataset": {"name": "hourly"}}],
            "retentionPeriod": {"unlimited": false, "numberOfDays": 30}
        })
    );
    assert_eq!(synthesized.references.computed("has_container_action"), Some(&Scalar::Bool(false)));
    assert_eq!(synthesized.references.computed("trigger_count"), Some(&Scalar::from(1usize)));
    assert_eq!(
        synthesized.references.outputs.keys().collect::<Vec<_>>(),
        vec!["id", "arn"]
    );
}

#[test]
fn test_dataset_action_needs_exactly_one_kind() {
    let pipeline = create_pipeline();

    let neither = pipeline.validate(iotanalytics_dataset::RESOURCE_TYPE, &dataset(json!({"action_name": "noop"})));
    let cause = validation_error(neither);
    assert_eq!(cause.path(), "actions[0]");
    assert_eq!(rule_of(&cause), "exactly_one_of_query_action_container_action");
    assert!(cause.to_string().contains("none of [query_action, container_action] is set"));
}

#[test]
fn test_dataset_retention_rule() {
    let pipeline = create_pipeline();
    let mut raw = dataset(json!({"action_name": "q", "query_action": {"sql_query": "select 1"}}));
    raw["retention_period"] = json!({"unlimited": true, "number_of_days": 10});

    let cause = validation_error(pipeline.validate(iotanalytics_dataset::RESOURCE_TYPE, &raw));
    assert_eq!(cause.path(), "retention_period");
    assert_eq!(rule_of(&cause), "unlimited_excludes_number_of_days");
}

#[test]
fn test_dataset_action_count_bounded() {
    let pipeline = create_pipeline();
    let action = json!({"action_name": "q", "query_action": {"sql_query": "select 1"}});
    let raw = json!({"dataset_name": "d", "actions": [action.clone(), action]});

    let cause = validation_error(pipeline.validate(iotanalytics_dataset::RESOURCE_TYPE, &raw));
    match cause {
        ValidationError::ConstraintViolation { field, constraint, expected, .. } => {
            assert_eq!(field, "actions");
            assert_eq!(constraint, ConstraintKind::SizeRange);
            assert!(expected.contains("1"), "{expected}");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// --- aws_iotanalytics_pipeline ---

#[test]
fn test_pipeline_activities_emitted_in_execution_order() {
    let pipeline = create_pipeline();
    let raw = json!({
        "pipeline_name": "ingest",
        "activities": [
            {"name": "store", "order": 3, "datastore": {"datastore_name": "telemetry"}},
            {"name": "source", "order": 1, "channel": {"channel_name": "raw"}},
            {"name": "enrich", "order": 2, "lambda": {"lambda_name": "enrich-fn", "batch_size": 10}}
        ],
        "tags": {"Team": "iot"}
    });

    let synthesized = pipeline
        .synthesize(iotanalytics_pipeline::RESOURCE_TYPE, "ingest", &raw)
        .unwrap();
    let block = &synthesized.block;
    assert_eq!(block.keys().collect::<Vec<_>>(), vec!["pipelineName", "pipelineActivities", "tags"]);

    let names: Vec<_> = block
        .list("pipelineActivities")
        .unwrap()
        .iter()
        .map(|a| match a {
            resourceforge_core::IrValue::Node(node) => node.scalar("name").and_then(Scalar::as_str).unwrap().to_string(),
            other => panic!("activity must be a node: {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["source", "enrich", "store"]);
    assert_eq!(synthesized.references.computed("activity_count"), Some(&Scalar::from(3usize)));
    assert_eq!(synthesized.references.computed("has_lambda"), Some(&Scalar::Bool(true)));
}

#[test]
fn test_pipeline_requires_channel_and_datastore() {
    let pipeline = create_pipeline();
    let raw = json!({
        "pipeline_name": "ingest",
        "activities": [{"name": "source", "order": 1, "channel": {"channel_name": "raw"}}]
    });

    let cause = validation_error(pipeline.validate(iotanalytics_pipeline::RESOURCE_TYPE, &raw));
    assert_eq!(rule_of(&cause), "requires_channel_and_datastore");
    assert!(cause.to_string().contains("`datastore`"));
}

#[test]
fn test_pipeline_activity_with_two_kinds_rejected() {
    let pipeline = create_pipeline();
    let raw = json!({
        "pipeline_name": "ingest",
        "activities": [
            {"name": "source", "order": 1, "channel": {"channel_name": "raw"}},
            {
                "name": "both",
                "order": 2,
                "datastore": {"datastore_name": "telemetry"},
                "channel": {"channel_name": "again"}
            }
        ]
    });

    let cause = validation_error(pipeline.validate(iotanalytics_pipeline::RESOURCE_TYPE, &raw));
    assert_eq!(cause.path(), "activities[1]");
    assert!(cause.to_string().contains("[channel, datastore] are all set"));
}

// --- aws_codestarnotifications_notification_rule ---

fn notification_rule_input() -> Value {
    json!({
        "name": "build alerts",
        "detail_type": "FULL",
        "event_type_ids": [
            "codebuild-project-build-state-failed",
            "codebuild-project-build-state-succeeded"
        ],
        "resource": "arn:aws:codebuild:us-east-1:123456789012:project/app",
        "targets": [{"address": "arn:aws:sns:us-east-1:123456789012:alerts"}]
    })
}

#[test]
fn test_notification_rule_defaults() {
    let pipeline = create_pipeline();
    let synthesized = pipeline
        .synthesize(notification_rule::RESOURCE_TYPE, "alerts", &notification_rule_input())
        .unwrap();

    let block = synthesized.block.to_json();
    assert_eq!(block["status"], json!("ENABLED"));
    assert_eq!(
        block["targets"],
        json!([{"address": "arn:aws:sns:us-east-1:123456789012:alerts", "type": "SNS"}])
    );
    assert_eq!(synthesized.references.computed("target_count"), Some(&Scalar::from(1usize)));
    assert_eq!(synthesized.references.computed("is_enabled"), Some(&Scalar::Bool(true)));
}

#[test]
fn test_notification_rule_element_errors_carry_index() {
    let pipeline = create_pipeline();

    let mut bad_event = notification_rule_input();
    bad_event["event_type_ids"] = json!(["codebuild-project-build-state-failed", "Not An Id"]);
    let cause = validation_error(pipeline.validate(notification_rule::RESOURCE_TYPE, &bad_event));
    assert_eq!(cause.path(), "event_type_ids[1]");

    let mut duplicate = notification_rule_input();
    duplicate["event_type_ids"] = json!(["codebuild-project-build-state-failed", "codebuild-project-build-state-failed"]);
    let cause = validation_error(pipeline.validate(notification_rule::RESOURCE_TYPE, &duplicate));
    assert_eq!(rule_of(&cause), "unique_event_type_ids");

    let mut stray_key = notification_rule_input();
    stray_key["targets"] = json!([{"address": "arn:aws:sns:us-east-1:123456789012:alerts", "region": "x"}]);
    let cause = validation_error(pipeline.validate(notification_rule::RESOURCE_TYPE, &stray_key));
    assert_eq!(cause.path(), "targets[0].region");
}

#[test]
fn test_notification_rule_tag_constraints() {
    let pipeline = create_pipeline();
    let mut raw = notification_rule_input();
    raw["tags"] = json!({"aws:owner": "me"});

    let cause = validation_error(pipeline.validate(notification_rule::RESOURCE_TYPE, &raw));
    match cause {
        ValidationError::ConstraintViolation { field, constraint, expected, .. } => {
            assert_eq!(field, "tags");
            assert_eq!(constraint, ConstraintKind::Predicate);
            assert!(expected.contains("aws:"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

// --- aws_medialive_channel ---

fn channel_input(class: &str, settings_per_destination: usize) -> Value {
    let settings: Vec<Value> = (0..settings_per_destination)
        .map(|i| json!({"url": format!("rtmp://ingest-{i}.example.com/live"), "stream_name": "main"}))
        .collect();
    json!({
        "name": "news-channel",
        "channel_class": class,
        "role_arn": "arn:aws:iam::123456789012:role/MediaLiveAccessRole",
        "input_specification": {"codec": "AVC", "maximum_bitrate": "MAX_20_MBPS", "input_resolution": "HD"},
        "destinations": [{"id": "primary", "settings": settings}],
        "input_attachments": [{"input_attachment_name": "studio", "input_id": "1234567", "input_settings": {}}],
        "encoder_settings": {
            "video_descriptions": [{"name": "video_1080p", "width": 1920, "height": 1080}],
            "output_groups": [{"name": "hls", "destination_ref_id": "primary"}]
        }
    })
}

#[test]
fn test_channel_composes_independent_builders() {
    let pipeline = create_pipeline();
    let synthesized = pipeline
        .synthesize(medialive_channel::RESOURCE_TYPE, "news", &channel_input("STANDARD", 2))
        .unwrap();
    let block = &synthesized.block;

    assert_eq!(
        block.keys().collect::<Vec<_>>(),
        vec![
            "name",
            "channelClass",
            "roleArn",
            "inputSpecification",
            "destinations",
            "inputAttachments",
            "encoderSettings",
            "logLevel",
        ]
    );
    let json = block.to_json();
    assert_eq!(
        json["inputAttachments"][0]["inputSettings"],
        json!({"sourceEndBehavior": "CONTINUE", "inputFilter": "AUTO"})
    );
    assert_eq!(json["encoderSettings"]["videoDescriptions"][0]["codec"], json!("H_264"));
    assert_eq!(json["encoderSettings"]["timecodeSource"], json!("EMBEDDED"));
    assert!(json["encoderSettings"].get("audioDescriptions").is_none());

    assert_eq!(synthesized.references.computed("has_role"), Some(&Scalar::Bool(true)));
    assert_eq!(synthesized.references.computed("pipelines_running_count"), Some(&Scalar::from(2usize)));
    assert_eq!(
        synthesized.references.output("channel_id").unwrap().canonical(),
        "aws_medialive_channel.news.channel_id"
    );
}

#[test]
fn test_channel_destination_settings_match_class() {
    let pipeline = create_pipeline();

    assert!(pipeline
        .validate(medialive_channel::RESOURCE_TYPE, &channel_input("SINGLE_PIPELINE", 1))
        .is_ok());

    let cause = validation_error(pipeline.validate(medialive_channel::RESOURCE_TYPE, &channel_input("SINGLE_PIPELINE", 2)));
    assert_eq!(rule_of(&cause), "destination_settings_per_pipeline");

    let cause = validation_error(pipeline.validate(medialive_channel::RESOURCE_TYPE, &channel_input("STANDARD", 1)));
    assert_eq!(rule_of(&cause), "destination_settings_per_pipeline");
}

#[test]
fn test_channel_class_accepts_token() {
    let pipeline = create_pipeline();
    let mut raw = channel_input("STANDARD", 1);
    raw["channel_class"] = json!("${aws_medialive_channel.template.channel_class}");

    let synthesized = pipeline
        .synthesize(medialive_channel::RESOURCE_TYPE, "mirror", &raw)
        .unwrap();
    assert_eq!(
        synthesized.references.computed("pipelines_running_count"),
        Some(&Scalar::from(1usize))
    );
}

#[test]
fn test_channel_output_groups_reference_declared_destinations() {
    let pipeline = create_pipeline();
    let mut raw = channel_input("STANDARD", 2);
    raw["encoder_settings"]["output_groups"] = json!([{"destination_ref_id": "backup"}]);

    let cause = validation_error(pipeline.validate(medialive_channel::RESOURCE_TYPE, &raw));
    assert_eq!(rule_of(&cause), "output_destinations_exist");
    assert!(cause.to_string().contains("`backup`"));
}

// --- aws_api_gateway_domain_name ---

#[test]
fn test_domain_name_defaults() {
    let pipeline = create_pipeline();
    let synthesized = pipeline
        .synthesize(api_gateway_domain::RESOURCE_TYPE, "api", &json!({"domain_name": "api.example.com"}))
        .unwrap();

    assert_eq!(
        synthesized.block.to_json(),
        json!({
            "domainName": "api.example.com",
            "endpointConfiguration": {"types": ["EDGE"]},
            "securityPolicy": "TLS_1_2"
        })
    );
    assert_eq!(synthesized.references.computed("endpoint_type"), Some(&Scalar::from("EDGE")));
    assert_eq!(synthesized.references.computed("is_custom_certificate"), Some(&Scalar::Bool(false)));
    assert_eq!(synthesized.references.outputs.len(), 6);
}

#[test]
fn test_domain_name_certificate_rules() {
    let pipeline = create_pipeline();
    let cert = "arn:aws:acm:us-east-1:123456789012:certificate/abc";

    let both = pipeline.validate(
        api_gateway_domain::RESOURCE_TYPE,
        &json!({"domain_name": "api.example.com", "certificate_arn": cert, "regional_certificate_arn": cert}),
    );
    assert_eq!(
        rule_of(&validation_error(both)),
        "at_most_one_of_certificate_arn_regional_certificate_arn"
    );

    let regional_on_edge = pipeline.validate(
        api_gateway_domain::RESOURCE_TYPE,
        &json!({"domain_name": "api.example.com", "regional_certificate_arn": cert}),
    );
    assert_eq!(
        rule_of(&validation_error(regional_on_edge)),
        "certificate_matches_endpoint_type"
    );

    let regional = pipeline
        .synthesize(
            api_gateway_domain::RESOURCE_TYPE,
            "api",
            &json!({
                "domain_name": "api.example.com",
                "regional_certificate_arn": cert,
                "endpoint_configuration": {"types": ["REGIONAL"]}
            }),
        )
        .unwrap();
    assert_eq!(regional.references.computed("endpoint_type"), Some(&Scalar::from("REGIONAL")));
    assert_eq!(regional.references.computed("is_custom_certificate"), Some(&Scalar::Bool(true)));
}

#[test]
fn test_domain_name_endpoint_type_accepts_token() {
    let pipeline = create_pipeline();
    let token = "${aws_api_gateway_domain_name.template.endpoint_type}";

    let domain = pipeline
        .synthesize(
            api_gateway_domain::RESOURCE_TYPE,
            "api",
            &json!({
                "domain_name": "api.example.com",
                "regional_certificate_arn": "arn:aws:acm:us-east-1:123456789012:certificate/abc",
                "endpoint_configuration": {"types": [token]}
            }),
        )
        .unwrap();
    assert_eq!(domain.references.computed("endpoint_type"), Some(&Scalar::from(token)));
}

#[test]
fn test_domain_name_hostname_pattern() {
    let pipeline = create_pipeline();
    let cause = validation_error(pipeline.validate(
        api_gateway_domain::RESOURCE_TYPE,
        &json!({"domain_name": "https://api.example.com"}),
    ));
    match cause {
        ValidationError::ConstraintViolation { field, constraint, expected, .. } => {
            assert_eq!(field, "domain_name");
            assert_eq!(constraint, ConstraintKind::Pattern);
            assert!(expected.contains("DNS name"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
