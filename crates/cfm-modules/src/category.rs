//! Service-category table for the by-service organization strategy.

use cfm_model::{LifecycleTier, ResourceNode};

/// Logical service groups over mapped target types, in priority order. A
/// type listed in more than one group lands in the earliest.
static SERVICE_GROUPS: &[(&str, &[&str])] = &[
    (
        "networking",
        &[
            "aws_vpc",
            "aws_subnet",
            "aws_internet_gateway",
            "aws_internet_gateway_attachment",
            "aws_route_table",
            "aws_route",
            "aws_route_table_association",
            "aws_nat_gateway",
            "aws_eip",
            "aws_eip_association",
            "aws_network_interface",
            "aws_network_interface_attachment",
        ],
    ),
    (
        "security",
        &[
            "aws_security_group",
            "aws_security_group_rule",
            "aws_iam_role",
            "aws_iam_policy",
            "aws_iam_role_policy",
            "aws_iam_user_policy",
            "aws_iam_group_policy",
            "aws_iam_user",
            "aws_iam_group",
            "aws_iam_instance_profile",
            "aws_iam_role_policy_attachment",
            "aws_iam_user_policy_attachment",
            "aws_iam_group_policy_attachment",
            "aws_kms_key",
            "aws_kms_alias",
            "aws_secretsmanager_secret",
            "aws_secretsmanager_secret_version",
        ],
    ),
    (
        "compute",
        &[
            "aws_instance",
            "aws_launch_template",
            "aws_launch_configuration",
            "aws_autoscaling_group",
            "aws_lambda_function",
            "aws_lambda_permission",
            "aws_lambda_alias",
            "aws_lambda_version",
            "aws_ecs_cluster",
            "aws_ecs_service",
            "aws_ecs_task_definition",
        ],
    ),
    (
        "storage",
        &[
            "aws_s3_bucket",
            "aws_s3_bucket_policy",
            "aws_s3_bucket_notification",
            "aws_ebs_volume",
            "aws_volume_attachment",
            "aws_efs_file_system",
            "aws_efs_mount_target",
        ],
    ),
    (
        "database",
        &[
            "aws_db_instance",
            "aws_rds_cluster",
            "aws_db_subnet_group",
            "aws_db_parameter_group",
            "aws_rds_cluster_parameter_group",
            "aws_dynamodb_table",
            "aws_elasticache_cluster",
            "aws_elasticache_replication_group",
            "aws_elasticache_subnet_group",
        ],
    ),
    (
        "load_balancing",
        &[
            "aws_elb",
            "aws_lb",
            "aws_lb_target_group",
            "aws_lb_listener",
            "aws_lb_listener_rule",
        ],
    ),
    ("dns", &["aws_route53_zone", "aws_route53_record"]),
    (
        "cdn",
        &[
            "aws_cloudfront_distribution",
            "aws_cloudfront_origin_access_identity",
        ],
    ),
    (
        "api",
        &[
            "aws_api_gateway_rest_api",
            "aws_api_gateway_resource",
            "aws_api_gateway_method",
            "aws_api_gateway_deployment",
            "aws_api_gateway_stage",
        ],
    ),
    (
        "messaging",
        &["aws_sns_topic", "aws_sns_topic_subscription", "aws_sqs_queue"],
    ),
    (
        "monitoring",
        &[
            "aws_cloudwatch_metric_alarm",
            "aws_cloudwatch_dashboard",
            "aws_cloudwatch_log_group",
            "aws_cloudwatch_log_stream",
        ],
    ),
];

/// Service category of a node: its target type's group, or a namespace
/// fallback for types no group claims.
pub(crate) fn category_of(node: &ResourceNode) -> String {
    node.target_type
        .as_deref()
        .and_then(group_for)
        .map_or_else(|| fallback_category(&node.source_type), str::to_string)
}

fn group_for(target_type: &str) -> Option<&'static str> {
    SERVICE_GROUPS
        .iter()
        .find(|(_, members)| members.contains(&target_type))
        .map(|(name, _)| *name)
}

/// Fallback bucket derived from the source namespace: `AWS::Foo::Bar`
/// lands in `foo_resources`, anything else in `other_resources`.
fn fallback_category(source_type: &str) -> String {
    match source_type
        .strip_prefix("AWS::")
        .and_then(|rest| rest.split("::").next())
    {
        Some(service) if !service.is_empty() => {
            format!("{}_resources", service.to_ascii_lowercase())
        }
        _ => "other_resources".to_string(),
    }
}

/// Module name for a lifecycle tier under the by-lifecycle strategy.
/// Unmapped nodes have no tier and land with the supporting bucket.
pub(crate) fn lifecycle_bucket(tier: Option<LifecycleTier>) -> &'static str {
    match tier {
        Some(LifecycleTier::Foundation) => "shared_infrastructure",
        Some(LifecycleTier::Application) => "application_resources",
        Some(LifecycleTier::Data) => "data_resources",
        Some(LifecycleTier::Support) | None => "supporting_resources",
    }
}
