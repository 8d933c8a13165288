use super::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A single check, run against every node of one kind.
///
/// Rules are stateless; everything they learn or report goes through the
/// [`ValidationContext`].
pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> NodeKind;

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>);
}

/// Rules indexed by the node kind they apply to, run in registration order.
#[derive(Clone, Default)]
pub struct RuleRegistry {
    rules: HashMap<NodeKind, Vec<Arc<dyn Rule>>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, rule: impl Rule + 'static) -> &mut Self {
        self.rules.entry(rule.kind()).or_default().push(Arc::new(rule));
        self
    }

    pub fn with(mut self, rule: impl Rule + 'static) -> Self {
        self.register(rule);
        self
    }

    pub fn rules_for(&self, kind: NodeKind) -> &[Arc<dyn Rule>] {
        self.rules.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names = self
            .rules
            .values()
            .flatten()
            .map(|r| r.name())
            .collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleRegistry")
            .field("rules", &self.names())
            .finish()
    }
}
