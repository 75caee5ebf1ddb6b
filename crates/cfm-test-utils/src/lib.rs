//! Shared fixtures and test plumbing.
//!
//! Integration tests across the workspace pull their inventories from
//! here so the same deployed-state scenario is exercised end to end at
//! every layer.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use cfm_model::{IndependentResource, Inventory, StackRecord};
use cfm_template::TemplateBody;

/// A network stack: a VPC, a subnet referencing it, and an unrelated
/// bucket.
const NETWORK_TEMPLATE: &str = r#"
AWSTemplateFormatVersion: "2010-09-09"
Description: Core network
Resources:
  Network:
    Type: AWS::EC2::VPC
    Properties:
      CidrBlock: 10.0.0.0/16
  AppSubnet:
    Type: AWS::EC2::Subnet
    Properties:
      VpcId: !Ref Network
      CidrBlock: 10.0.1.0/24
  Artifacts:
    Type: AWS::S3::Bucket
    Properties:
      BucketName: artifacts-prod
Outputs:
  VpcId:
    Value: !Ref Network
"#;

/// The network stack plus a resource of a type no registry knows.
const WIDGET_TEMPLATE: &str = r#"
AWSTemplateFormatVersion: "2010-09-09"
Resources:
  Network:
    Type: AWS::EC2::VPC
    Properties:
      CidrBlock: 10.0.0.0/16
  AppSubnet:
    Type: AWS::EC2::Subnet
    Properties:
      VpcId: !Ref Network
      CidrBlock: 10.0.1.0/24
  Artifacts:
    Type: AWS::S3::Bucket
    Properties:
      BucketName: artifacts-prod
  Widget:
    Type: Custom::Monitor
    Properties:
      Endpoint: https://monitor.example.test
"#;

/// Installs an env-filtered subscriber for a test binary. Safe to call
/// from every test; only the first call wins.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parses a template fixture, panicking with context when it is broken.
#[must_use]
pub fn template(body: &str) -> TemplateBody {
    TemplateBody::from_yaml_str(body).expect("fixture template must parse")
}

/// The network stack with deployed physical ids for every resource.
#[must_use]
pub fn network_stack() -> StackRecord {
    let mut stack =
        StackRecord::new("stack-net", "network", "us-east-1", template(NETWORK_TEMPLATE));
    stack
        .physical_ids
        .insert("Network".to_string(), "vpc-0a1b2c".to_string());
    stack
        .physical_ids
        .insert("AppSubnet".to_string(), "subnet-0d3e4f".to_string());
    stack
        .physical_ids
        .insert("Artifacts".to_string(), "artifacts-prod".to_string());
    stack
}

/// An inventory holding just the network stack.
#[must_use]
pub fn network_inventory() -> Inventory {
    let mut inventory = Inventory::new();
    inventory.add_stack(network_stack());
    inventory
}

/// The network scenario plus one resource of an unknown type, deployed
/// and carrying a physical id like everything else.
#[must_use]
pub fn inventory_with_unknown_type() -> Inventory {
    let mut stack =
        StackRecord::new("stack-net", "network", "us-east-1", template(WIDGET_TEMPLATE));
    stack
        .physical_ids
        .insert("Network".to_string(), "vpc-0a1b2c".to_string());
    stack
        .physical_ids
        .insert("AppSubnet".to_string(), "subnet-0d3e4f".to_string());
    stack
        .physical_ids
        .insert("Artifacts".to_string(), "artifacts-prod".to_string());
    stack
        .physical_ids
        .insert("Widget".to_string(), "widget-777".to_string());
    let mut inventory = Inventory::new();
    inventory.add_stack(stack);
    inventory
}

/// An independent volume nothing references, for mixed-inventory tests.
#[must_use]
pub fn independent_volume() -> IndependentResource {
    let mut resource = IndependentResource::new("vol-0f9e8d", "AWS::EBS::Volume", "us-east-1");
    resource
        .tags
        .insert("Name".to_string(), "scratch".to_string());
    resource
}
