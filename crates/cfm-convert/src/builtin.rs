//! The built-in mapping table.
//!
//! One entry per supported source type, grouped by service family. Entries
//! spell out only what differs from [`TypeMapping::simple`]: renames the
//! CamelCase-to-snake_case fallback would get wrong, import identities that
//! are not the plain physical id, structural reshapes, and lifecycle tiers
//! for the types the by-lifecycle strategy distinguishes.

use cfm_model::{LifecycleTier, PropertyValue, TargetExpr};
use indexmap::IndexMap;

use crate::registry::{IdPart, ImportIdentity, TypeMapping};

/// Every built-in source type with its mapping, in registration order.
pub(crate) static MAPPINGS: &[(&str, TypeMapping)] = &[
    // Compute
    (
        "AWS::EC2::Instance",
        TypeMapping {
            attribute_renames: &[
                ("PrivateDnsName", "private_dns"),
                ("PublicDnsName", "public_dns"),
            ],
            property_renames: &[
                ("ImageId", "ami"),
                ("SecurityGroupIds", "vpc_security_group_ids"),
                ("BlockDeviceMappings", "ebs_block_device"),
            ],
            required: &["ami", "instance_type"],
            lifecycle: LifecycleTier::Application,
            ..TypeMapping::simple("aws_instance")
        },
    ),
    ("AWS::EC2::LaunchTemplate", TypeMapping::simple("aws_launch_template")),
    (
        "AWS::EC2::LaunchConfiguration",
        TypeMapping {
            property_renames: &[("ImageId", "image_id")],
            ..TypeMapping::simple("aws_launch_configuration")
        },
    ),
    (
        "AWS::AutoScaling::AutoScalingGroup",
        TypeMapping {
            property_renames: &[("VPCZoneIdentifier", "vpc_zone_identifier")],
            lifecycle: LifecycleTier::Application,
            ..TypeMapping::simple("aws_autoscaling_group")
        },
    ),
    (
        "AWS::AutoScaling::LaunchConfiguration",
        TypeMapping::simple("aws_launch_configuration"),
    ),
    (
        "AWS::Lambda::Function",
        TypeMapping {
            drop_properties: &["Code"],
            required: &["role"],
            lifecycle: LifecycleTier::Application,
            ..TypeMapping::simple("aws_lambda_function")
        },
    ),
    (
        "AWS::Lambda::Permission",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("FunctionName"), IdPart::PhysicalId],
                separator: "/",
            },
            ..TypeMapping::simple("aws_lambda_permission")
        },
    ),
    (
        "AWS::Lambda::Alias",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("FunctionName"), IdPart::Property("Name")],
                separator: ":",
            },
            ..TypeMapping::simple("aws_lambda_alias")
        },
    ),
    (
        "AWS::Lambda::Version",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("FunctionName"), IdPart::PhysicalId],
                separator: ":",
            },
            ..TypeMapping::simple("aws_lambda_version")
        },
    ),
    ("AWS::ECS::Cluster", TypeMapping::simple("aws_ecs_cluster")),
    (
        "AWS::ECS::Service",
        TypeMapping {
            lifecycle: LifecycleTier::Application,
            ..TypeMapping::simple("aws_ecs_service")
        },
    ),
    ("AWS::ECS::TaskDefinition", TypeMapping::simple("aws_ecs_task_definition")),
    // Networking
    (
        "AWS::EC2::VPC",
        TypeMapping {
            attribute_renames: &[("DefaultSecurityGroup", "default_security_group_id")],
            required: &["cidr_block"],
            lifecycle: LifecycleTier::Foundation,
            ..TypeMapping::simple("aws_vpc")
        },
    ),
    (
        "AWS::EC2::Subnet",
        TypeMapping {
            required: &["vpc_id", "cidr_block"],
            lifecycle: LifecycleTier::Foundation,
            ..TypeMapping::simple("aws_subnet")
        },
    ),
    (
        "AWS::EC2::InternetGateway",
        TypeMapping {
            lifecycle: LifecycleTier::Foundation,
            ..TypeMapping::simple("aws_internet_gateway")
        },
    ),
    (
        "AWS::EC2::VPCGatewayAttachment",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("VpcId"), IdPart::Property("InternetGatewayId")],
                separator: "/",
            },
            ..TypeMapping::simple("aws_internet_gateway_attachment")
        },
    ),
    (
        "AWS::EC2::RouteTable",
        TypeMapping {
            lifecycle: LifecycleTier::Foundation,
            ..TypeMapping::simple("aws_route_table")
        },
    ),
    (
        "AWS::EC2::Route",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[
                    IdPart::Property("RouteTableId"),
                    IdPart::Property("DestinationCidrBlock"),
                ],
                separator: "_",
            },
            lifecycle: LifecycleTier::Foundation,
            ..TypeMapping::simple("aws_route")
        },
    ),
    (
        "AWS::EC2::SubnetRouteTableAssociation",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("SubnetId"), IdPart::Property("RouteTableId")],
                separator: "/",
            },
            ..TypeMapping::simple("aws_route_table_association")
        },
    ),
    (
        "AWS::EC2::SecurityGroup",
        TypeMapping {
            property_renames: &[
                ("GroupDescription", "description"),
                ("GroupName", "name"),
                ("SecurityGroupIngress", "ingress"),
                ("SecurityGroupEgress", "egress"),
            ],
            reshape: Some(reshape_rule_blocks),
            ..TypeMapping::simple("aws_security_group")
        },
    ),
    (
        "AWS::EC2::SecurityGroupIngress",
        TypeMapping {
            property_renames: STANDALONE_RULE_RENAMES,
            reshape: Some(reshape_ingress_rule),
            ..TypeMapping::simple("aws_security_group_rule")
        },
    ),
    (
        "AWS::EC2::SecurityGroupEgress",
        TypeMapping {
            property_renames: STANDALONE_RULE_RENAMES,
            reshape: Some(reshape_egress_rule),
            ..TypeMapping::simple("aws_security_group_rule")
        },
    ),
    (
        "AWS::EC2::NatGateway",
        TypeMapping {
            lifecycle: LifecycleTier::Foundation,
            ..TypeMapping::simple("aws_nat_gateway")
        },
    ),
    (
        "AWS::EC2::EIP",
        TypeMapping {
            id_attribute: "public_ip",
            ..TypeMapping::simple("aws_eip")
        },
    ),
    ("AWS::EC2::EIPAssociation", TypeMapping::simple("aws_eip_association")),
    ("AWS::EC2::NetworkInterface", TypeMapping::simple("aws_network_interface")),
    (
        "AWS::EC2::NetworkInterfaceAttachment",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[
                    IdPart::Property("NetworkInterfaceId"),
                    IdPart::Property("InstanceId"),
                ],
                separator: ":",
            },
            ..TypeMapping::simple("aws_network_interface_attachment")
        },
    ),
    // Load balancing
    (
        "AWS::ElasticLoadBalancing::LoadBalancer",
        TypeMapping {
            attribute_renames: &[("CanonicalHostedZoneNameID", "zone_id")],
            ..TypeMapping::simple("aws_elb")
        },
    ),
    (
        "AWS::ElasticLoadBalancingV2::LoadBalancer",
        TypeMapping {
            attribute_renames: &[("CanonicalHostedZoneID", "zone_id")],
            lifecycle: LifecycleTier::Application,
            ..TypeMapping::simple("aws_lb")
        },
    ),
    (
        "AWS::ElasticLoadBalancingV2::TargetGroup",
        TypeMapping::simple("aws_lb_target_group"),
    ),
    (
        "AWS::ElasticLoadBalancingV2::Listener",
        TypeMapping {
            property_renames: &[("DefaultActions", "default_action")],
            required: &["load_balancer_arn"],
            ..TypeMapping::simple("aws_lb_listener")
        },
    ),
    (
        "AWS::ElasticLoadBalancingV2::ListenerRule",
        TypeMapping {
            property_renames: &[("Actions", "action"), ("Conditions", "condition")],
            ..TypeMapping::simple("aws_lb_listener_rule")
        },
    ),
    // Storage
    (
        "AWS::S3::Bucket",
        TypeMapping {
            attribute_renames: &[
                ("DomainName", "bucket_domain_name"),
                ("RegionalDomainName", "bucket_regional_domain_name"),
                ("WebsiteURL", "website_endpoint"),
            ],
            property_renames: &[
                ("BucketName", "bucket"),
                ("AccessControl", "acl"),
                ("BucketEncryption", "server_side_encryption_configuration"),
                ("PublicAccessBlockConfiguration", "public_access_block"),
                ("VersioningConfiguration", "versioning"),
            ],
            lifecycle: LifecycleTier::Data,
            ..TypeMapping::simple("aws_s3_bucket")
        },
    ),
    (
        "AWS::S3::BucketPolicy",
        TypeMapping {
            property_renames: &[("PolicyDocument", "policy")],
            import_identity: ImportIdentity::Property("Bucket"),
            reshape: Some(encode_policy_documents),
            ..TypeMapping::simple("aws_s3_bucket_policy")
        },
    ),
    (
        "AWS::S3::BucketNotification",
        TypeMapping {
            import_identity: ImportIdentity::Property("Bucket"),
            ..TypeMapping::simple("aws_s3_bucket_notification")
        },
    ),
    ("AWS::EBS::Volume", TypeMapping::simple("aws_ebs_volume")),
    (
        "AWS::EC2::VolumeAttachment",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[
                    IdPart::Property("Device"),
                    IdPart::Property("VolumeId"),
                    IdPart::Property("InstanceId"),
                ],
                separator: ":",
            },
            ..TypeMapping::simple("aws_volume_attachment")
        },
    ),
    ("AWS::EFS::FileSystem", TypeMapping::simple("aws_efs_file_system")),
    ("AWS::EFS::MountTarget", TypeMapping::simple("aws_efs_mount_target")),
    // Database
    (
        "AWS::RDS::DBInstance",
        TypeMapping {
            attribute_renames: &[("Endpoint.Address", "address"), ("Endpoint.Port", "port")],
            property_renames: &[
                ("DBInstanceIdentifier", "identifier"),
                ("DBInstanceClass", "instance_class"),
                ("MasterUsername", "username"),
                ("MasterUserPassword", "password"),
                ("VPCSecurityGroups", "vpc_security_group_ids"),
                ("PreferredBackupWindow", "backup_window"),
                ("PreferredMaintenanceWindow", "maintenance_window"),
            ],
            required: &["instance_class"],
            lifecycle: LifecycleTier::Data,
            ..TypeMapping::simple("aws_db_instance")
        },
    ),
    (
        "AWS::RDS::DBCluster",
        TypeMapping {
            attribute_renames: &[("Endpoint.Address", "endpoint")],
            property_renames: &[
                ("DBClusterIdentifier", "cluster_identifier"),
                ("MasterUsername", "master_username"),
                ("MasterUserPassword", "master_password"),
            ],
            lifecycle: LifecycleTier::Data,
            ..TypeMapping::simple("aws_rds_cluster")
        },
    ),
    (
        "AWS::RDS::DBSubnetGroup",
        TypeMapping {
            property_renames: &[("DBSubnetGroupName", "name"), ("DBSubnetGroupDescription", "description")],
            ..TypeMapping::simple("aws_db_subnet_group")
        },
    ),
    (
        "AWS::RDS::DBParameterGroup",
        TypeMapping::simple("aws_db_parameter_group"),
    ),
    (
        "AWS::RDS::DBClusterParameterGroup",
        TypeMapping::simple("aws_rds_cluster_parameter_group"),
    ),
    (
        "AWS::DynamoDB::Table",
        TypeMapping {
            property_renames: &[("TableName", "name")],
            lifecycle: LifecycleTier::Data,
            ..TypeMapping::simple("aws_dynamodb_table")
        },
    ),
    (
        "AWS::ElastiCache::CacheCluster",
        TypeMapping {
            property_renames: &[("ClusterName", "cluster_id")],
            ..TypeMapping::simple("aws_elasticache_cluster")
        },
    ),
    (
        "AWS::ElastiCache::ReplicationGroup",
        TypeMapping {
            lifecycle: LifecycleTier::Data,
            ..TypeMapping::simple("aws_elasticache_replication_group")
        },
    ),
    (
        "AWS::ElastiCache::SubnetGroup",
        TypeMapping {
            property_renames: &[("CacheSubnetGroupName", "name")],
            ..TypeMapping::simple("aws_elasticache_subnet_group")
        },
    ),
    // IAM
    (
        "AWS::IAM::Role",
        TypeMapping {
            attribute_renames: &[("RoleId", "unique_id")],
            property_renames: &[
                ("AssumeRolePolicyDocument", "assume_role_policy"),
                ("RoleName", "name"),
            ],
            drop_properties: &["Policies"],
            required: &["assume_role_policy"],
            lifecycle: LifecycleTier::Foundation,
            import_identity: ImportIdentity::Property("RoleName"),
            reshape: Some(encode_policy_documents),
            ..TypeMapping::simple("aws_iam_role")
        },
    ),
    (
        "AWS::IAM::Policy",
        TypeMapping {
            property_renames: &[("PolicyDocument", "policy"), ("PolicyName", "name")],
            discriminator: Some(discriminate_iam_policy),
            reshape: Some(encode_policy_documents),
            ..TypeMapping::simple("aws_iam_policy")
        },
    ),
    (
        "AWS::IAM::User",
        TypeMapping {
            property_renames: &[("UserName", "name")],
            import_identity: ImportIdentity::Property("UserName"),
            ..TypeMapping::simple("aws_iam_user")
        },
    ),
    (
        "AWS::IAM::Group",
        TypeMapping {
            property_renames: &[("GroupName", "name")],
            import_identity: ImportIdentity::Property("GroupName"),
            ..TypeMapping::simple("aws_iam_group")
        },
    ),
    (
        "AWS::IAM::InstanceProfile",
        TypeMapping {
            property_renames: &[("InstanceProfileName", "name")],
            reshape: Some(reshape_instance_profile),
            ..TypeMapping::simple("aws_iam_instance_profile")
        },
    ),
    (
        "AWS::IAM::RolePolicyAttachment",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("RoleName"), IdPart::Property("PolicyArn")],
                separator: "/",
            },
            ..TypeMapping::simple("aws_iam_role_policy_attachment")
        },
    ),
    (
        "AWS::IAM::UserPolicyAttachment",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("UserName"), IdPart::Property("PolicyArn")],
                separator: "/",
            },
            ..TypeMapping::simple("aws_iam_user_policy_attachment")
        },
    ),
    (
        "AWS::IAM::GroupPolicyAttachment",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("GroupName"), IdPart::Property("PolicyArn")],
                separator: "/",
            },
            ..TypeMapping::simple("aws_iam_group_policy_attachment")
        },
    ),
    // DNS
    (
        "AWS::Route53::HostedZone",
        TypeMapping {
            property_renames: &[("Name", "name"), ("HostedZoneConfig", "comment")],
            lifecycle: LifecycleTier::Foundation,
            ..TypeMapping::simple("aws_route53_zone")
        },
    ),
    (
        "AWS::Route53::RecordSet",
        TypeMapping {
            property_renames: &[
                ("HostedZoneId", "zone_id"),
                ("ResourceRecords", "records"),
                ("TTL", "ttl"),
            ],
            required: &["zone_id", "name", "type"],
            import_identity: ImportIdentity::Compound {
                parts: &[
                    IdPart::Property("HostedZoneId"),
                    IdPart::Property("Name"),
                    IdPart::Property("Type"),
                ],
                separator: "_",
            },
            ..TypeMapping::simple("aws_route53_record")
        },
    ),
    // CDN
    (
        "AWS::CloudFront::Distribution",
        TypeMapping::simple("aws_cloudfront_distribution"),
    ),
    (
        "AWS::CloudFront::OriginAccessIdentity",
        TypeMapping::simple("aws_cloudfront_origin_access_identity"),
    ),
    // API Gateway
    ("AWS::ApiGateway::RestApi", TypeMapping::simple("aws_api_gateway_rest_api")),
    (
        "AWS::ApiGateway::Resource",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("RestApiId"), IdPart::PhysicalId],
                separator: "/",
            },
            ..TypeMapping::simple("aws_api_gateway_resource")
        },
    ),
    (
        "AWS::ApiGateway::Method",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[
                    IdPart::Property("RestApiId"),
                    IdPart::Property("ResourceId"),
                    IdPart::Property("HttpMethod"),
                ],
                separator: "/",
            },
            ..TypeMapping::simple("aws_api_gateway_method")
        },
    ),
    (
        "AWS::ApiGateway::Deployment",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("RestApiId"), IdPart::PhysicalId],
                separator: "/",
            },
            ..TypeMapping::simple("aws_api_gateway_deployment")
        },
    ),
    (
        "AWS::ApiGateway::Stage",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("RestApiId"), IdPart::Property("StageName")],
                separator: "/",
            },
            ..TypeMapping::simple("aws_api_gateway_stage")
        },
    ),
    // Messaging
    (
        "AWS::SNS::Topic",
        TypeMapping {
            id_attribute: "arn",
            property_renames: &[("TopicName", "name")],
            ..TypeMapping::simple("aws_sns_topic")
        },
    ),
    (
        "AWS::SNS::Subscription",
        TypeMapping {
            required: &["topic_arn", "protocol", "endpoint"],
            ..TypeMapping::simple("aws_sns_topic_subscription")
        },
    ),
    (
        "AWS::SQS::Queue",
        TypeMapping {
            id_attribute: "url",
            attribute_renames: &[("QueueName", "name")],
            property_renames: &[("QueueName", "name")],
            ..TypeMapping::simple("aws_sqs_queue")
        },
    ),
    // Monitoring
    (
        "AWS::CloudWatch::Alarm",
        TypeMapping {
            property_renames: &[("AlarmName", "alarm_name")],
            import_identity: ImportIdentity::Property("AlarmName"),
            ..TypeMapping::simple("aws_cloudwatch_metric_alarm")
        },
    ),
    (
        "AWS::CloudWatch::Dashboard",
        TypeMapping::simple("aws_cloudwatch_dashboard"),
    ),
    (
        "AWS::Logs::LogGroup",
        TypeMapping {
            property_renames: &[("LogGroupName", "name")],
            ..TypeMapping::simple("aws_cloudwatch_log_group")
        },
    ),
    (
        "AWS::Logs::LogStream",
        TypeMapping {
            property_renames: &[("LogStreamName", "name")],
            import_identity: ImportIdentity::Compound {
                parts: &[
                    IdPart::Property("LogGroupName"),
                    IdPart::Property("LogStreamName"),
                ],
                separator: ":",
            },
            ..TypeMapping::simple("aws_cloudwatch_log_stream")
        },
    ),
    // Security
    (
        "AWS::KMS::Key",
        TypeMapping {
            property_renames: &[("KeyPolicy", "policy")],
            lifecycle: LifecycleTier::Foundation,
            reshape: Some(encode_policy_documents),
            ..TypeMapping::simple("aws_kms_key")
        },
    ),
    (
        "AWS::KMS::Alias",
        TypeMapping {
            property_renames: &[("AliasName", "name")],
            import_identity: ImportIdentity::Property("AliasName"),
            ..TypeMapping::simple("aws_kms_alias")
        },
    ),
    (
        "AWS::SecretsManager::Secret",
        TypeMapping {
            property_renames: &[("Name", "name")],
            ..TypeMapping::simple("aws_secretsmanager_secret")
        },
    ),
    (
        "AWS::SecretsManager::SecretVersion",
        TypeMapping {
            import_identity: ImportIdentity::Compound {
                parts: &[IdPart::Property("SecretId"), IdPart::PhysicalId],
                separator: "|",
            },
            ..TypeMapping::simple("aws_secretsmanager_secret_version")
        },
    ),
];

/// Top-level renames shared by the standalone ingress and egress rule types.
static STANDALONE_RULE_RENAMES: &[(&'static str, &'static str)] = &[
    ("IpProtocol", "protocol"),
    ("GroupId", "security_group_id"),
    ("CidrIp", "cidr_blocks"),
    ("CidrIpv6", "ipv6_cidr_blocks"),
];

/// One inline policy source type splits into standalone and attached target
/// types depending on what it is attached to.
fn discriminate_iam_policy(resolved: &IndexMap<String, PropertyValue>) -> &'static str {
    if resolved.contains_key("Roles") {
        "aws_iam_role_policy"
    } else if resolved.contains_key("Users") {
        "aws_iam_user_policy"
    } else if resolved.contains_key("Groups") {
        "aws_iam_group_policy"
    } else {
        "aws_iam_policy"
    }
}

/// Policy documents arrive as structured maps; the target schema wants a
/// JSON string, so wrap them in a `jsonencode` call.
fn encode_policy_documents(props: &mut IndexMap<String, PropertyValue>) {
    for key in ["policy", "assume_role_policy"] {
        if let Some(value) = props.get_mut(key) {
            if matches!(value, PropertyValue::Map(_)) {
                let document = std::mem::replace(value, PropertyValue::Null);
                *value = PropertyValue::Unresolved(TargetExpr::Call {
                    name: "jsonencode".to_string(),
                    args: vec![document],
                });
            }
        }
    }
}

/// Inline rule blocks keep their source field spelling after the top-level
/// rename pass; rewrite each rule map to the target schema's field names.
fn reshape_rule_blocks(props: &mut IndexMap<String, PropertyValue>) {
    for key in ["ingress", "egress"] {
        if let Some(PropertyValue::List(rules)) = props.get_mut(key) {
            for rule in rules {
                if let PropertyValue::Map(fields) = rule {
                    reshape_rule_fields(fields);
                }
            }
        }
    }
}

fn reshape_rule_fields(fields: &mut IndexMap<String, PropertyValue>) {
    rename_field(fields, "IpProtocol", "protocol");
    rename_field(fields, "FromPort", "from_port");
    rename_field(fields, "ToPort", "to_port");
    rename_field(fields, "Description", "description");
    rename_field(fields, "CidrIp", "cidr_blocks");
    rename_field(fields, "CidrIpv6", "ipv6_cidr_blocks");
    rename_field(fields, "SourceSecurityGroupId", "security_groups");
    for key in ["cidr_blocks", "ipv6_cidr_blocks", "security_groups"] {
        wrap_in_list(fields, key);
    }
}

fn reshape_ingress_rule(props: &mut IndexMap<String, PropertyValue>) {
    reshape_standalone_rule(props, "ingress");
}

fn reshape_egress_rule(props: &mut IndexMap<String, PropertyValue>) {
    reshape_standalone_rule(props, "egress");
}

/// Standalone rule resources carry their direction in the type name on the
/// source side but as a `type` field on the target side.
fn reshape_standalone_rule(props: &mut IndexMap<String, PropertyValue>, direction: &str) {
    props.insert("type".to_string(), PropertyValue::String(direction.to_string()));
    for key in ["cidr_blocks", "ipv6_cidr_blocks"] {
        wrap_in_list(props, key);
    }
}

/// The source schema allows several roles per instance profile; the target
/// schema takes exactly one.
fn reshape_instance_profile(props: &mut IndexMap<String, PropertyValue>) {
    let first = match props.get("roles") {
        Some(PropertyValue::List(roles)) => roles.first().cloned(),
        _ => None,
    };
    if let Some(role) = first {
        props.shift_remove("roles");
        props.insert("role".to_string(), role);
    }
}

fn rename_field(map: &mut IndexMap<String, PropertyValue>, from: &str, to: &str) {
    if let Some(value) = map.shift_remove(from) {
        map.insert(to.to_string(), value);
    }
}

fn wrap_in_list(map: &mut IndexMap<String, PropertyValue>, key: &str) {
    if let Some(value) = map.get_mut(key) {
        if !matches!(value, PropertyValue::List(_)) {
            let scalar = std::mem::replace(value, PropertyValue::Null);
            *value = PropertyValue::List(vec![scalar]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_duplicate_source_types() {
        let mut seen = std::collections::HashSet::new();
        for (source_type, _) in MAPPINGS {
            assert!(seen.insert(*source_type), "duplicate entry for {source_type}");
        }
    }

    #[test]
    fn target_types_are_snake_case() {
        for (source_type, mapping) in MAPPINGS {
            assert!(
                mapping
                    .target_type
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{source_type} maps to non-snake-case {}",
                mapping.target_type
            );
        }
    }

    #[test]
    fn policy_documents_become_encode_calls() {
        let mut props = IndexMap::new();
        props.insert(
            "assume_role_policy".to_string(),
            PropertyValue::Map(IndexMap::from_iter([(
                "Version".to_string(),
                PropertyValue::from("2012-10-17"),
            )])),
        );
        encode_policy_documents(&mut props);
        match &props["assume_role_policy"] {
            PropertyValue::Unresolved(TargetExpr::Call { name, args }) => {
                assert_eq!(name, "jsonencode");
                assert_eq!(args.len(), 1);
            }
            other => panic!("expected jsonencode call, got {other:?}"),
        }
    }

    #[test]
    fn standalone_rules_gain_direction_and_lists() {
        let mut props = IndexMap::new();
        props.insert("protocol".to_string(), PropertyValue::from("tcp"));
        props.insert("cidr_blocks".to_string(), PropertyValue::from("10.0.0.0/16"));
        reshape_ingress_rule(&mut props);
        assert_eq!(props["type"], PropertyValue::from("ingress"));
        assert_eq!(
            props["cidr_blocks"],
            PropertyValue::List(vec![PropertyValue::from("10.0.0.0/16")])
        );
    }

    #[test]
    fn inline_rule_blocks_are_rewritten() {
        let mut rule = IndexMap::new();
        rule.insert("IpProtocol".to_string(), PropertyValue::from("tcp"));
        rule.insert(
            "FromPort".to_string(),
            PropertyValue::Number(serde_json::Number::from(443)),
        );
        rule.insert("CidrIp".to_string(), PropertyValue::from("0.0.0.0/0"));
        let mut props = IndexMap::new();
        props.insert(
            "ingress".to_string(),
            PropertyValue::List(vec![PropertyValue::Map(rule)]),
        );
        reshape_rule_blocks(&mut props);
        let PropertyValue::List(rules) = &props["ingress"] else {
            panic!("ingress must stay a list");
        };
        let PropertyValue::Map(fields) = &rules[0] else {
            panic!("rule must stay a map");
        };
        assert!(fields.contains_key("protocol"));
        assert!(fields.contains_key("from_port"));
        assert_eq!(
            fields["cidr_blocks"],
            PropertyValue::List(vec![PropertyValue::from("0.0.0.0/0")])
        );
    }

    #[test]
    fn instance_profile_takes_first_role() {
        let mut props = IndexMap::new();
        props.insert(
            "roles".to_string(),
            PropertyValue::List(vec![PropertyValue::from("app-role"), PropertyValue::from("extra")]),
        );
        reshape_instance_profile(&mut props);
        assert!(!props.contains_key("roles"));
        assert_eq!(props["role"], PropertyValue::from("app-role"));
    }
}
