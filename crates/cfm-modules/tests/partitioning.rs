//! End-to-end partitioning behavior across all four strategies.

use cfm_graph::{EdgeKind, ResourceGraph};
use cfm_model::{LifecycleTier, NodeId, PropertyValue, ResourceNode, TargetExpr};
use cfm_modules::{
    partition, ModuleSet, OrganizationStrategy, PartitionContext, PartitionError,
    PartitionOptions,
};
use petgraph::algo::is_cyclic_directed;
use petgraph::graphmap::DiGraphMap;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn stack_node(
    stack_id: &str,
    logical: &str,
    source: &str,
    target: Option<&str>,
    ordinal: usize,
) -> ResourceNode {
    let mut node = ResourceNode::from_template(stack_id, logical, source, ordinal);
    match target {
        Some(target) => node.target_type = Some(target.to_string()),
        None => node.unsupported = true,
    }
    node
}

fn attr(node: NodeId, attribute: &str) -> PropertyValue {
    PropertyValue::Unresolved(TargetExpr::Attr {
        node,
        attribute: attribute.to_string(),
    })
}

/// A network (CIDR 10.0.0.0/16), a subnet referencing it, and an unrelated
/// bucket, all in one stack.
fn network_scenario() -> (ResourceGraph, NodeId, NodeId, NodeId) {
    let mut graph = ResourceGraph::new();

    let mut vpc = stack_node("stack-1", "Network", "AWS::EC2::VPC", Some("aws_vpc"), 0);
    vpc.lifecycle = Some(LifecycleTier::Foundation);
    vpc.mapped_properties
        .insert("cidr_block".into(), "10.0.0.0/16".into());
    let vpc_id = graph.add_node(vpc).unwrap();

    let mut subnet = stack_node(
        "stack-1",
        "AppSubnet",
        "AWS::EC2::Subnet",
        Some("aws_subnet"),
        1,
    );
    subnet.lifecycle = Some(LifecycleTier::Foundation);
    subnet
        .mapped_properties
        .insert("vpc_id".into(), attr(vpc_id, "id"));
    subnet
        .mapped_properties
        .insert("cidr_block".into(), "10.0.1.0/24".into());
    let subnet_id = graph.add_node(subnet).unwrap();

    let mut bucket = stack_node(
        "stack-1",
        "Artifacts",
        "AWS::S3::Bucket",
        Some("aws_s3_bucket"),
        2,
    );
    bucket.lifecycle = Some(LifecycleTier::Data);
    let bucket_id = graph.add_node(bucket).unwrap();

    graph.add_edge(vpc_id, subnet_id, EdgeKind::Strong).unwrap();
    (graph, vpc_id, subnet_id, bucket_id)
}

#[test]
fn by_service_splits_network_and_storage() {
    let (graph, vpc, subnet, bucket) = network_scenario();
    let set = partition(
        &graph,
        &PartitionOptions::default(),
        &PartitionContext::default(),
    )
    .unwrap();

    assert_eq!(set.len(), 2);
    assert_eq!(set.module_of(vpc), Some("networking"));
    assert_eq!(set.module_of(subnet), Some("networking"));
    assert_eq!(set.module_of(bucket), Some("storage"));

    let networking = set.get("networking").unwrap();
    assert_eq!(networking.resources.len(), 2);
    // The reference stays direct: both ends live in the same module.
    let subnet_def = networking.resource(subnet).unwrap();
    assert_eq!(subnet_def.properties["vpc_id"], attr(vpc, "id"));
    assert!(networking.variables.is_empty());
    assert!(networking.outputs.is_empty());

    let storage = set.get("storage").unwrap();
    assert_eq!(storage.resources.len(), 1);
    assert_eq!(
        storage.resource(bucket).unwrap().address,
        "aws_s3_bucket.artifacts"
    );
}

#[test]
fn crossing_reference_becomes_one_output_variable_pair() {
    let (mut graph, _, subnet, _) = network_scenario();
    let mut host = stack_node(
        "stack-1",
        "Host",
        "AWS::EC2::Instance",
        Some("aws_instance"),
        3,
    );
    host.mapped_properties
        .insert("subnet_id".into(), attr(subnet, "id"));
    let host_id = graph.add_node(host).unwrap();
    graph.add_edge(subnet, host_id, EdgeKind::Strong).unwrap();

    let set = partition(
        &graph,
        &PartitionOptions::default(),
        &PartitionContext::default(),
    )
    .unwrap();

    let networking = set.get("networking").unwrap();
    assert_eq!(networking.outputs.len(), 1);
    assert_eq!(networking.outputs[0].name, "app_subnet_id");
    assert_eq!(networking.outputs[0].value, attr(subnet, "id"));

    let compute = set.get("compute").unwrap();
    assert_eq!(compute.variables.len(), 1);
    let variable = &compute.variables[0];
    assert_eq!(variable.name, "app_subnet_id");
    let binding = variable.binding.as_ref().unwrap();
    assert_eq!(binding.module, "networking");
    assert_eq!(binding.output, "app_subnet_id");

    let host_def = compute.resource(host_id).unwrap();
    assert_eq!(
        host_def.properties["subnet_id"],
        PropertyValue::Unresolved(TargetExpr::Var("app_subnet_id".into()))
    );
}

#[test]
fn every_node_lands_in_exactly_one_module() {
    let (mut graph, ..) = network_scenario();
    let widget = stack_node("stack-1", "Widget", "Custom::Widget", None, 3);
    let widget_id = graph.add_node(widget).unwrap();

    for strategy in [
        OrganizationStrategy::ByService,
        OrganizationStrategy::ByStack,
        OrganizationStrategy::ByLifecycle,
        OrganizationStrategy::Hybrid,
    ] {
        let options = PartitionOptions {
            strategy,
            ..PartitionOptions::default()
        };
        let set = partition(&graph, &options, &PartitionContext::default()).unwrap();

        let total: usize = set.modules().map(|m| m.members.len()).sum();
        assert_eq!(total, graph.node_count(), "{strategy:?}");
        for id in graph.node_ids() {
            assert!(set.module_of(id).is_some(), "{strategy:?}");
        }
        // Unsupported members never produce a resource definition.
        let module = set.get(set.module_of(widget_id).unwrap()).unwrap();
        assert!(module.resource(widget_id).is_none());
    }
}

#[test]
fn by_stack_modules_carry_template_outputs() {
    let (mut graph, vpc, ..) = network_scenario();
    let mut volume = ResourceNode::from_independent("vol-123", "AWS::EC2::Volume", 3);
    volume.target_type = Some("aws_ebs_volume".to_string());
    let volume_id = graph.add_node(volume).unwrap();

    let mut context = PartitionContext::default();
    context
        .stack_names
        .insert("stack-1".into(), "Network Stack".into());
    context.stack_outputs.insert(
        "stack-1".into(),
        [("VpcId".to_string(), attr(vpc, "id"))].into_iter().collect(),
    );

    let options = PartitionOptions {
        strategy: OrganizationStrategy::ByStack,
        ..PartitionOptions::default()
    };
    let set = partition(&graph, &options, &context).unwrap();

    assert_eq!(set.len(), 2);
    let stack_module = set.get("network_stack").unwrap();
    assert_eq!(stack_module.members.len(), 3);
    assert_eq!(stack_module.outputs.len(), 1);
    assert_eq!(stack_module.outputs[0].name, "vpc_id");
    assert_eq!(stack_module.outputs[0].value, attr(vpc, "id"));

    let independent = set.get("independent_resources").unwrap();
    assert_eq!(independent.members, vec![volume_id]);
}

#[test]
fn lifecycle_strategy_buckets_by_tier() {
    let (mut graph, vpc, subnet, bucket) = network_scenario();
    let widget = stack_node("stack-1", "Widget", "Custom::Widget", None, 3);
    let widget_id = graph.add_node(widget).unwrap();

    let options = PartitionOptions {
        strategy: OrganizationStrategy::ByLifecycle,
        ..PartitionOptions::default()
    };
    let set = partition(&graph, &options, &PartitionContext::default()).unwrap();

    assert_eq!(set.module_of(vpc), Some("shared_infrastructure"));
    assert_eq!(set.module_of(subnet), Some("shared_infrastructure"));
    assert_eq!(set.module_of(bucket), Some("data_resources"));
    assert_eq!(set.module_of(widget_id), Some("supporting_resources"));
}

#[test]
fn hybrid_merges_small_stacks_and_splits_large_ones() {
    let mut graph = ResourceGraph::new();
    // A two-resource stack dissolves into the global service buckets.
    let vpc = graph
        .add_node(stack_node("tiny", "Vpc", "AWS::EC2::VPC", Some("aws_vpc"), 0))
        .unwrap();
    let bucket = graph
        .add_node(stack_node(
            "tiny",
            "Logs",
            "AWS::S3::Bucket",
            Some("aws_s3_bucket"),
            1,
        ))
        .unwrap();
    // A busy stack splits along service lines.
    let mut hosts = Vec::new();
    for i in 0..3 {
        let host = stack_node(
            "backend",
            &format!("Host{i}"),
            "AWS::EC2::Instance",
            Some("aws_instance"),
            2 + i,
        );
        hosts.push(graph.add_node(host).unwrap());
    }
    let queue = graph
        .add_node(stack_node(
            "backend",
            "Jobs",
            "AWS::SQS::Queue",
            Some("aws_sqs_queue"),
            5,
        ))
        .unwrap();

    let options = PartitionOptions {
        strategy: OrganizationStrategy::Hybrid,
        hybrid_min_module_size: 3,
        hybrid_max_module_size: 3,
        ..PartitionOptions::default()
    };
    let set = partition(&graph, &options, &PartitionContext::default()).unwrap();

    assert_eq!(set.module_of(vpc), Some("networking"));
    assert_eq!(set.module_of(bucket), Some("storage"));
    for host in &hosts {
        assert_eq!(set.module_of(*host), Some("backend_compute"));
    }
    assert_eq!(set.module_of(queue), Some("backend_messaging"));
}

#[test]
fn references_to_unemitted_producers_become_operator_variables() {
    let mut graph = ResourceGraph::new();
    let widget = graph
        .add_node(stack_node("stack-1", "Widget", "Custom::Widget", None, 0))
        .unwrap();
    let mut host = stack_node(
        "stack-1",
        "Host",
        "AWS::EC2::Instance",
        Some("aws_instance"),
        1,
    );
    host.mapped_properties
        .insert("user_data".into(), attr(widget, "id"));
    let host_id = graph.add_node(host).unwrap();
    graph.add_edge(widget, host_id, EdgeKind::Strong).unwrap();

    let set = partition(
        &graph,
        &PartitionOptions::default(),
        &PartitionContext::default(),
    )
    .unwrap();

    let compute = set.get("compute").unwrap();
    let variable = compute.variable("widget_id").unwrap();
    assert!(variable.binding.is_none());
    assert_eq!(
        compute.resource(host_id).unwrap().properties["user_data"],
        PropertyValue::Unresolved(TargetExpr::Var("widget_id".into()))
    );
    // Nothing to export on the producer side.
    let other = set.get("other_resources").unwrap();
    assert!(other.outputs.is_empty());
    assert!(other.resources.is_empty());
}

#[test]
fn module_collapse_cycles_are_fatal() {
    let mut graph = ResourceGraph::new();
    let vpc = graph
        .add_node(stack_node("s", "Vpc", "AWS::EC2::VPC", Some("aws_vpc"), 0))
        .unwrap();
    let host = graph
        .add_node(stack_node(
            "s",
            "Host",
            "AWS::EC2::Instance",
            Some("aws_instance"),
            1,
        ))
        .unwrap();
    let agent = graph
        .add_node(stack_node(
            "s",
            "Agent",
            "AWS::EC2::Instance",
            Some("aws_instance"),
            2,
        ))
        .unwrap();
    let subnet = graph
        .add_node(stack_node(
            "s",
            "Net",
            "AWS::EC2::Subnet",
            Some("aws_subnet"),
            3,
        ))
        .unwrap();
    // Acyclic between nodes, cyclic once collapsed to modules:
    // networking -> compute and compute -> networking.
    graph.add_edge(vpc, host, EdgeKind::Strong).unwrap();
    graph.add_edge(agent, subnet, EdgeKind::Strong).unwrap();

    let err = partition(
        &graph,
        &PartitionOptions::default(),
        &PartitionContext::default(),
    )
    .unwrap_err();
    match err {
        PartitionError::CyclicModuleDependency { path } => {
            assert!(path.contains(&"networking".to_string()));
            assert!(path.contains(&"compute".to_string()));
        }
    }
}

#[test]
fn placeholder_variables_are_declared_once() {
    let mut graph = ResourceGraph::new();
    let mut topic = stack_node("s", "Alerts", "AWS::SNS::Topic", Some("aws_sns_topic"), 0);
    topic.mapped_properties.insert(
        "name".into(),
        PropertyValue::Unresolved(TargetExpr::Concat(vec![
            PropertyValue::Unresolved(TargetExpr::Var("stack_name".into())),
            "-alerts".into(),
        ])),
    );
    topic.mapped_properties.insert(
        "display_name".into(),
        PropertyValue::Unresolved(TargetExpr::Var("stack_name".into())),
    );
    graph.add_node(topic).unwrap();

    let set = partition(
        &graph,
        &PartitionOptions::default(),
        &PartitionContext::default(),
    )
    .unwrap();
    let messaging = set.get("messaging").unwrap();
    assert_eq!(messaging.variables.len(), 1);
    assert_eq!(messaging.variables[0].name, "stack_name");
    assert!(messaging.variables[0].binding.is_none());
}

#[test]
fn original_names_survive_when_requested() {
    let (graph, vpc, ..) = network_scenario();
    let options = PartitionOptions {
        preserve_original_names: true,
        ..PartitionOptions::default()
    };
    let set = partition(&graph, &options, &PartitionContext::default()).unwrap();

    let networking = set.get("networking").unwrap();
    let resource = networking.resource(vpc).unwrap();
    assert_eq!(resource.name, "Network");
    assert_eq!(resource.address, "aws_vpc.Network");

    // Without the flag the same name is rewritten to snake_case.
    let default_set =
        partition(&graph, &PartitionOptions::default(), &PartitionContext::default()).unwrap();
    let resource = default_set.get("networking").unwrap().resource(vpc).unwrap();
    assert_eq!(resource.name, "network");
}

#[test]
fn partitioning_is_deterministic() {
    let (graph, ..) = network_scenario();
    let options = PartitionOptions::default();
    let first = partition(&graph, &options, &PartitionContext::default()).unwrap();
    let second = partition(&graph, &options, &PartitionContext::default()).unwrap();
    assert_eq!(first, second);
}

const TYPE_CHOICES: &[(&str, Option<&str>)] = &[
    ("AWS::EC2::VPC", Some("aws_vpc")),
    ("AWS::EC2::Subnet", Some("aws_subnet")),
    ("AWS::EC2::Instance", Some("aws_instance")),
    ("AWS::S3::Bucket", Some("aws_s3_bucket")),
    ("AWS::SQS::Queue", Some("aws_sqs_queue")),
    ("Custom::Widget", None),
];

fn random_graph(type_picks: &[(usize, usize)], edges: &[(usize, usize)]) -> ResourceGraph {
    let mut graph = ResourceGraph::new();
    let mut ids = Vec::new();
    for (ordinal, (type_index, stack_index)) in type_picks.iter().enumerate() {
        let (source, target) = TYPE_CHOICES[type_index % TYPE_CHOICES.len()];
        let node = stack_node(
            &format!("stack-{stack_index}"),
            &format!("Node{ordinal}"),
            source,
            target,
            ordinal,
        );
        ids.push(graph.add_node(node).unwrap());
    }
    // Edges only ever point from a lower ordinal to a higher one, so the
    // node graph is acyclic by construction.
    for (a, b) in edges {
        let (i, j) = (a.min(b), a.max(b));
        if i == j || *j >= ids.len() {
            continue;
        }
        graph.add_edge(ids[*i], ids[*j], EdgeKind::Strong).unwrap();
        let consumer = ids[*j];
        let producer = ids[*i];
        if let Some(node) = graph.node_mut(consumer) {
            node.mapped_properties
                .insert(format!("dep_{i}"), attr(producer, "id"));
        }
    }
    graph
}

fn collapsed(graph: &ResourceGraph, set: &ModuleSet) -> DiGraphMap<usize, ()> {
    let names: Vec<&str> = set.modules().map(|m| m.name.as_str()).collect();
    let mut out = DiGraphMap::new();
    for index in 0..names.len() {
        out.add_node(index);
    }
    for (from, to, kind) in graph.edges() {
        if kind != EdgeKind::Strong {
            continue;
        }
        let (Some(a), Some(b)) = (set.module_of(from), set.module_of(to)) else {
            continue;
        };
        if a == b {
            continue;
        }
        let ia = names.iter().position(|n| *n == a).unwrap();
        let ib = names.iter().position(|n| *n == b).unwrap();
        out.add_edge(ia, ib, ());
    }
    out
}

proptest! {
    #[test]
    fn prop_partitions_cover_nodes_and_never_leak_cycles(
        type_picks in proptest::collection::vec((0..6usize, 0..3usize), 1..14),
        edges in proptest::collection::vec((0..14usize, 0..14usize), 0..40),
    ) {
        let graph = random_graph(&type_picks, &edges);
        let context = PartitionContext::default();

        for strategy in [
            OrganizationStrategy::ByService,
            OrganizationStrategy::ByStack,
            OrganizationStrategy::ByLifecycle,
            OrganizationStrategy::Hybrid,
        ] {
            let options = PartitionOptions {
                strategy,
                hybrid_min_module_size: 2,
                hybrid_max_module_size: 5,
                ..PartitionOptions::default()
            };
            match partition(&graph, &options, &context) {
                Ok(set) => {
                    let total: usize = set.modules().map(|m| m.members.len()).sum();
                    prop_assert_eq!(total, graph.node_count());
                    // A returned partition never hides a module cycle.
                    prop_assert!(!is_cyclic_directed(&collapsed(&graph, &set)));
                    // No raw cross-module attribute reference survives.
                    for module in set.modules() {
                        for resource in &module.resources {
                            for value in resource.properties.values() {
                                for (producer, _) in value.attr_refs() {
                                    prop_assert_eq!(
                                        set.module_of(producer),
                                        Some(module.name.as_str())
                                    );
                                }
                            }
                        }
                    }
                }
                Err(PartitionError::CyclicModuleDependency { path }) => {
                    prop_assert!(path.len() >= 2);
                }
            }
        }
    }

    #[test]
    fn prop_layout_is_stable_across_runs(
        type_picks in proptest::collection::vec((0..6usize, 0..3usize), 1..10),
        edges in proptest::collection::vec((0..10usize, 0..10usize), 0..20),
    ) {
        let graph = random_graph(&type_picks, &edges);
        let options = PartitionOptions::default();
        let context = PartitionContext::default();
        match (
            partition(&graph, &options, &context),
            partition(&graph, &options, &context),
        ) {
            (Ok(first), Ok(second)) => prop_assert_eq!(first, second),
            (Err(_), Err(_)) => {}
            _ => prop_assert!(false, "partition outcome changed between runs"),
        }
    }
}
