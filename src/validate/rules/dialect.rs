use super::*;

/// Flags use of a feature the target dialect lacks.
#[derive(Debug, Clone, Copy)]
pub struct FeatureRule {
    feature: Feature,
    dialect: Dialect,
}

impl FeatureRule {
    pub fn new(feature: Feature, dialect: Dialect) -> Self {
        Self { feature, dialect }
    }

    fn used_by(&self, node: Node<'_>) -> bool {
        match (self.feature, node) {
            (Feature::DistinctOn, Node::Select(select)) => {
                matches!(select.distinct(), Some(Distinct::On(_)))
            }
            (Feature::Lateral, Node::Table(table)) => table.is_lateral(),
            (Feature::FullJoin, Node::Join(join)) => join.kind == JoinKind::Full,
            (Feature::RightJoin, Node::Join(join)) => join.kind == JoinKind::Right,
            (Feature::WindowFunctions, Node::Function(call)) => call.over.is_some(),
            (Feature::Cte, Node::With(_)) => true,
            (Feature::RecursiveCte, Node::With(with)) => with.recursive,
            _ => false,
        }
    }
}

impl Rule for FeatureRule {
    fn name(&self) -> &'static str {
        match self.feature {
            Feature::DistinctOn => "dialect_distinct_on",
            Feature::Lateral => "dialect_lateral",
            Feature::FullJoin => "dialect_full_join",
            Feature::RightJoin => "dialect_right_join",
            Feature::WindowFunctions => "dialect_window_functions",
            Feature::Cte => "dialect_cte",
            Feature::RecursiveCte => "dialect_recursive_cte",
        }
    }

    fn kind(&self) -> NodeKind {
        match self.feature {
            Feature::DistinctOn => NodeKind::Select,
            Feature::Lateral => NodeKind::Table,
            Feature::FullJoin | Feature::RightJoin => NodeKind::Join,
            Feature::WindowFunctions => NodeKind::Function,
            Feature::Cte | Feature::RecursiveCte => NodeKind::With,
        }
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        if self.used_by(node) {
            ctx.report(
                ProblemCode::UnsupportedFeature,
                node.kind(),
                format!("{} is not supported by {}", self.feature, self.dialect),
            );
        }
    }
}
