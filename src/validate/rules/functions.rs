use super::*;

/// Calls to catalog functions must respect arity, `*`, `DISTINCT` and `OVER`.
pub struct FunctionSignatureRule;

impl Rule for FunctionSignatureRule {
    fn name(&self) -> &'static str {
        "function_signature"
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Function
    }

    fn check(&self, node: Node<'_>, ctx: &mut ValidationContext<'_>) {
        let Node::Function(call) = node else {
            return;
        };
        let Some(signature) = ctx.functions().get(&call.name) else {
            return;
        };
        let arity = call.args.len();
        let mut report = |message: String| {
            ctx.report(ProblemCode::FunctionSignature, NodeKind::Function, message)
        };

        if !signature.accepts(arity) {
            report(format!(
                "function `{}` expects {} argument(s), got {arity}",
                call.name,
                signature.arity_text()
            ));
        }
        if call.has_star_argument() && !(signature.aggregate && signature.name == "count" && arity == 1) {
            report(format!("`*` is only allowed as the sole argument of count, not `{}`", call.name));
        }
        if call.distinct && !signature.aggregate {
            report(format!("DISTINCT is only allowed in aggregate calls, not `{}`", call.name));
        }
        if signature.window_only && call.over.is_none() {
            report(format!("window function `{}` requires an OVER clause", call.name));
        }
    }
}
