use cfm_template::{Expr, TemplateBody};

const YAML_TEMPLATE: &str = r#"
Description: two-tier network
Parameters:
  Env:
    Type: String
    Default: dev
Conditions:
  IsProd: !Equals [!Ref Env, prod]
Resources:
  Vpc:
    Type: AWS::EC2::VPC
    Properties:
      CidrBlock: 10.0.0.0/16
      Tags:
        - Key: Name
          Value: !Sub "${Env}-vpc"
  Subnet:
    Type: AWS::EC2::Subnet
    DependsOn: Vpc
    Properties:
      VpcId: !Ref Vpc
      AvailabilityZone: !Select [0, !GetAZs ""]
Outputs:
  VpcId:
    Value: !Ref Vpc
"#;

#[test]
fn test_yaml_and_json_parse_to_the_same_body() {
    let from_yaml = TemplateBody::from_yaml_str(YAML_TEMPLATE).unwrap();

    let json_text = r#"{
        "Description": "two-tier network",
        "Parameters": {"Env": {"Type": "String", "Default": "dev"}},
        "Conditions": {"IsProd": {"Fn::Equals": [{"Ref": "Env"}, "prod"]}},
        "Resources": {
            "Vpc": {
                "Type": "AWS::EC2::VPC",
                "Properties": {
                    "CidrBlock": "10.0.0.0/16",
                    "Tags": [{"Key": "Name", "Value": {"Fn::Sub": "${Env}-vpc"}}]
                }
            },
            "Subnet": {
                "Type": "AWS::EC2::Subnet",
                "DependsOn": "Vpc",
                "Properties": {
                    "VpcId": {"Ref": "Vpc"},
                    "AvailabilityZone": {"Fn::Select": [0, {"Fn::GetAZs": ""}]}
                }
            }
        },
        "Outputs": {"VpcId": {"Value": {"Ref": "Vpc"}}}
    }"#;
    let from_json = TemplateBody::from_json_str(json_text).unwrap();

    assert_eq!(from_yaml, from_json);
}

#[test]
fn test_parsed_body_exposes_structure() {
    let body = TemplateBody::from_yaml_str(YAML_TEMPLATE).unwrap();

    assert_eq!(body.resources.len(), 2);
    let subnet = &body.resources["Subnet"];
    assert_eq!(subnet.resource_type, "AWS::EC2::Subnet");
    assert_eq!(subnet.depends_on, vec!["Vpc".to_string()]);
    assert_eq!(subnet.properties["VpcId"], Expr::Ref("Vpc".into()));

    match &subnet.properties["AvailabilityZone"] {
        Expr::Select { index, list } => {
            assert_eq!(index.as_lit_index(), Some(0));
            assert!(matches!(**list, Expr::GetAzs(_)));
        }
        other => panic!("wrong variant: {other:?}"),
    }
}

#[test]
fn test_unsupported_intrinsic_survives_round_trip_into_unknown() {
    let body = TemplateBody::from_yaml_str(
        "Resources:\n  R:\n    Type: T\n    Properties:\n      X: !ImportValue shared\n",
    )
    .unwrap();
    match &body.resources["R"].properties["X"] {
        Expr::Unknown { name, .. } => assert_eq!(name, "Fn::ImportValue"),
        other => panic!("wrong variant: {other:?}"),
    }
}
