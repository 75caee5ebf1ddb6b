//! Whole-pipeline conversions over realistic inventories.

use cfm_engine::{Engine, EngineError, MigrationConfig};
use cfm_model::{NodeId, PropertyValue, StackRecord, TargetExpr};
use cfm_modules::OrganizationStrategy;
use cfm_template::TemplateBody;
use cfm_test_utils as fixtures;
use pretty_assertions::assert_eq;

fn node_id(logical: &str) -> NodeId {
    NodeId::for_stack_resource("stack-net", logical)
}

#[test]
fn network_scenario_partitions_by_service() {
    fixtures::init_tracing();
    let engine = Engine::new(MigrationConfig::default());
    let conversion = engine.convert(&fixtures::network_inventory()).unwrap();

    let modules = &conversion.modules;
    assert_eq!(modules.len(), 2);
    let networking = modules.get("networking").unwrap();
    assert_eq!(networking.resources.len(), 2);
    let storage = modules.get("storage").unwrap();
    assert_eq!(storage.resources.len(), 1);
    assert_eq!(storage.resources[0].address, "aws_s3_bucket.artifacts");

    // The subnet keeps a direct reference to the network's identifier;
    // both live in the same module, so no variable is involved.
    let subnet = networking.resource(node_id("AppSubnet")).unwrap();
    assert_eq!(
        subnet.properties.get("vpc_id"),
        Some(&PropertyValue::Unresolved(TargetExpr::Attr {
            node: node_id("Network"),
            attribute: "id".to_string(),
        }))
    );
    assert!(networking.variables.is_empty());

    let plan = &conversion.plan;
    assert_eq!(plan.len(), 3);
    let rank_of = |address: &str| plan.entry(address).unwrap().rank;
    assert!(rank_of("module.networking.aws_vpc.network") < rank_of("module.networking.aws_subnet.app_subnet"));

    // The bucket is unordered relative to the network pair.
    let bucket = plan.entry("module.storage.aws_s3_bucket.artifacts").unwrap();
    assert_eq!(bucket.batch, 0);
    assert_eq!(bucket.identity, "artifacts-prod");

    assert!(conversion.report.entries.is_empty());
    assert_eq!(conversion.report.counts.resources, 3);
    assert_eq!(conversion.report.counts.converted, 3);
    assert_eq!(conversion.report.counts.modules, 2);
}

#[test]
fn unknown_types_degrade_to_findings_not_errors() {
    let engine = Engine::new(MigrationConfig::default());
    let conversion = engine
        .convert(&fixtures::inventory_with_unknown_type())
        .unwrap();

    // Siblings convert normally.
    assert_eq!(conversion.modules.resource_count(), 3);
    assert_eq!(conversion.plan.len(), 3);

    // The widget is a member somewhere but emits nothing and imports
    // nothing.
    let widget = node_id("Widget");
    let module_name = conversion.modules.module_of(widget).unwrap().to_string();
    let module = conversion.modules.get(&module_name).unwrap();
    assert!(module.resource(widget).is_none());
    assert!(conversion.plan.entries().iter().all(|e| e.node != widget));

    let report = &conversion.report;
    assert_eq!(report.counts.unsupported, 1);
    assert_eq!(report.counts.skipped_imports, 1);
    assert!(report
        .entries
        .iter()
        .any(|e| e.kind == "unsupported-resource-type" && e.subject == "Widget"));
    assert!(report
        .entries
        .iter()
        .any(|e| e.kind == "skipped-import" && e.reason.contains("Widget")));
}

#[test]
fn conversions_are_deterministic() {
    let engine = Engine::new(MigrationConfig::default());
    let first = engine.convert(&fixtures::network_inventory()).unwrap();
    let second = engine.convert(&fixtures::network_inventory()).unwrap();
    assert_eq!(first.modules, second.modules);
    assert_eq!(first.plan, second.plan);
    assert_eq!(first.report.entries, second.report.entries);
    assert_eq!(first.report.counts, second.report.counts);
}

#[test]
fn by_stack_strategy_keeps_stacks_whole() {
    let config = MigrationConfig {
        strategy: OrganizationStrategy::ByStack,
        ..MigrationConfig::default()
    };
    let engine = Engine::new(config);
    let mut inventory = fixtures::network_inventory();
    inventory.add_independent(fixtures::independent_volume());
    let conversion = engine.convert(&inventory).unwrap();

    let modules = &conversion.modules;
    assert_eq!(modules.len(), 2);
    let stack_module = modules.get("network").unwrap();
    assert_eq!(stack_module.resources.len(), 3);

    // Template outputs survive as module outputs on the stack module.
    let output = stack_module.output("vpc_id").unwrap();
    assert_eq!(
        output.value,
        PropertyValue::Unresolved(TargetExpr::Attr {
            node: node_id("Network"),
            attribute: "id".to_string(),
        })
    );

    let independent = modules.get("independent_resources").unwrap();
    assert_eq!(independent.resources[0].address, "aws_ebs_volume.vol_0f9e8d");
    assert_eq!(
        conversion
            .plan
            .entry("module.independent_resources.aws_ebs_volume.vol_0f9e8d")
            .unwrap()
            .identity,
        "vol-0f9e8d"
    );
}

#[test]
fn hybrid_strategy_merges_small_stacks_into_service_buckets() {
    let config = MigrationConfig {
        strategy: OrganizationStrategy::Hybrid,
        hybrid_min_module_size: 4,
        ..MigrationConfig::default()
    };
    let engine = Engine::new(config);
    let conversion = engine.convert(&fixtures::network_inventory()).unwrap();

    // Three resources sit under the minimum, so the stack dissolves into
    // the global service buckets.
    assert!(conversion.modules.get("networking").is_some());
    assert!(conversion.modules.get("storage").is_some());
    assert!(conversion.modules.get("network").is_none());
}

#[test]
fn rendered_reports_name_every_problem() {
    let engine = Engine::new(MigrationConfig::default());
    let conversion = engine
        .convert(&fixtures::inventory_with_unknown_type())
        .unwrap();

    let text = conversion.report.render();
    assert!(text.contains("resources discovered:  4"));
    assert!(text.contains("unsupported types:     1"));
    assert!(text.contains("Custom::Monitor"));
    assert!(text.contains("import skipped"));
}

#[test]
fn hard_dependency_cycles_abort_the_conversion() {
    let body = TemplateBody::from_yaml_str(
        r#"
Resources:
  First:
    Type: AWS::EC2::VPC
    DependsOn: Second
    Properties:
      CidrBlock: 10.0.0.0/16
  Second:
    Type: AWS::EC2::VPC
    DependsOn: First
    Properties:
      CidrBlock: 10.1.0.0/16
"#,
    )
    .unwrap();
    let mut inventory = cfm_model::Inventory::new();
    inventory.add_stack(StackRecord::new("stack-loop", "loop", "us-east-1", body));

    let engine = Engine::new(MigrationConfig::default());
    let err = engine.convert(&inventory).unwrap_err();
    assert!(matches!(err, EngineError::Graph(_)));
    assert!(err.to_string().contains("cyclic dependency"));
}
