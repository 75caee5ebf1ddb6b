//! Pseudo parameter resolution.
//!
//! Source templates reach a handful of runtime values through reserved
//! `AWS::` names. Most map onto provider data sources; stack identity
//! becomes a module variable so the emitted configuration stays portable
//! across deployments.

use cfm_model::TargetExpr;

/// Resolution of one pseudo parameter reference.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Pseudo {
    /// The reference maps onto a concrete target expression.
    Expr(TargetExpr),
    /// `AWS::NoValue`: the property holding the reference is omitted.
    NoValue,
}

/// True when a `Ref` target sits in the reserved pseudo parameter namespace.
pub(crate) fn is_pseudo(name: &str) -> bool {
    name.starts_with("AWS::")
}

/// Looks up a pseudo parameter. `None` means the name is reserved but
/// unknown, which callers record as an unresolved-intrinsic finding.
pub(crate) fn lookup(name: &str) -> Option<Pseudo> {
    let expr = match name {
        "AWS::NoValue" => return Some(Pseudo::NoValue),
        "AWS::Region" => TargetExpr::Data("data.aws_region.current.name".to_string()),
        "AWS::AccountId" => {
            TargetExpr::Data("data.aws_caller_identity.current.account_id".to_string())
        }
        "AWS::Partition" => TargetExpr::Data("data.aws_partition.current.partition".to_string()),
        "AWS::URLSuffix" => TargetExpr::Data("data.aws_partition.current.dns_suffix".to_string()),
        "AWS::StackName" => TargetExpr::Var("stack_name".to_string()),
        "AWS::StackId" => TargetExpr::Var("stack_id".to_string()),
        "AWS::NotificationARNs" => TargetExpr::Var("notification_arns".to_string()),
        _ => return None,
    };
    Some(Pseudo::Expr(expr))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_maps_to_data_source() {
        match lookup("AWS::Region") {
            Some(Pseudo::Expr(TargetExpr::Data(path))) => {
                assert_eq!(path, "data.aws_region.current.name");
            }
            other => panic!("unexpected resolution: {other:?}"),
        }
    }

    #[test]
    fn no_value_is_distinguished() {
        assert_eq!(lookup("AWS::NoValue"), Some(Pseudo::NoValue));
    }

    #[test]
    fn unknown_pseudo_is_none() {
        assert!(is_pseudo("AWS::FutureThing"));
        assert!(lookup("AWS::FutureThing").is_none());
        assert!(!is_pseudo("MyParameter"));
    }
}
