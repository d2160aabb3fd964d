use std::collections::HashSet;

use crate::vir::*;

/// Returns ident of lvalue.
fn get_lvalue_ident(lvalue: &Expression) -> &str {
    if let Expression::Primary(Primary::HierarchicalIdentifier(ident, _)) = lvalue {
        ident
    } else {
        panic!("lvalue should be hierarchical identifier");
    }
}

trait OptimizeDeadcodeWalk {
    /// Get used variables.
    fn walk(&self, used: &mut HashSet<String>);
}

impl OptimizeDeadcodeWalk for Vec<ModuleItem> {
    fn walk(&self, used: &mut HashSet<String>) {
        for module_item in self {
            module_item.walk(used);
        }
    }
}

impl OptimizeDeadcodeWalk for ModuleItem {
    fn walk(&self, used: &mut HashSet<String>) {
        match self {
            ModuleItem::Declarations(_) => {}
            ModuleItem::ContinuousAssigns(conts) => {
                for ContinuousAssign(_, expr) in conts {
                    expr.walk(used);
                }
            }
            // Clocks are input ports, so the event control needs no walk.
            ModuleItem::AlwaysConstruct(_, stmts) => stmts.walk(used),
            ModuleItem::Commented(_, _, items) => items.walk(used),
        }
    }
}

impl OptimizeDeadcodeWalk for Vec<Statement> {
    fn walk(&self, used: &mut HashSet<String>) {
        for stmt in self {
            stmt.walk(used);
        }
    }
}

impl OptimizeDeadcodeWalk for Statement {
    fn walk(&self, used: &mut HashSet<String>) {
        match self {
            Self::Conditional(cond, then_stmt) => {
                cond.walk(used);
                then_stmt.walk(used);
            }
            Self::NonblockingAssignment(_, expr) => expr.walk(used),
        }
    }
}

impl OptimizeDeadcodeWalk for Expression {
    fn walk(&self, used: &mut HashSet<String>) {
        match self {
            Self::Primary(prim) => prim.walk(used),
            Self::Unary(_, prim) => prim.walk(used),
            Self::Binary(lhs, _, rhs) => {
                lhs.walk(used);
                rhs.walk(used);
            }
        }
    }
}

impl OptimizeDeadcodeWalk for Primary {
    fn walk(&self, used: &mut HashSet<String>) {
        match self {
            Self::Number(_) => {}
            Self::HierarchicalIdentifier(ident, _) => {
                used.insert(ident.clone());
            }
            Self::Concatenation(concat) => {
                for expr in &concat.exprs {
                    expr.walk(used);
                }
            }
            Self::MintypmaxExpression(expr) => expr.walk(used),
        }
    }
}

trait OptimizeDeadcode {
    /// Optimizes by using dead code elimination.
    fn optimize(&self, used: &HashSet<String>) -> Self;
}

impl OptimizeDeadcode for Vec<ModuleItem> {
    fn optimize(&self, used: &HashSet<String>) -> Self {
        self.iter()
            .filter_map(|module_item| match module_item {
                ModuleItem::Declarations(decls) => {
                    let decls = decls.iter().filter(|decl| used.contains(decl.ident())).cloned().collect::<Vec<_>>();
                    if decls.is_empty() {
                        None
                    } else {
                        Some(ModuleItem::Declarations(decls))
                    }
                }
                ModuleItem::ContinuousAssigns(conts) => {
                    let conts = conts
                        .iter()
                        .filter(|ContinuousAssign(lvalue, _)| used.contains(get_lvalue_ident(lvalue)))
                        .cloned()
                        .collect::<Vec<_>>();
                    if conts.is_empty() {
                        None
                    } else {
                        Some(ModuleItem::ContinuousAssigns(conts))
                    }
                }
                ModuleItem::AlwaysConstruct(event, stmts) => {
                    let stmts = stmts.optimize(used);
                    if stmts.is_empty() {
                        None
                    } else {
                        Some(ModuleItem::AlwaysConstruct(event.clone(), stmts))
                    }
                }
                ModuleItem::Commented(comment_before, comment_after, items) => {
                    let items = items.optimize(used);
                    if items.is_empty() {
                        None
                    } else {
                        Some(ModuleItem::Commented(comment_before.clone(), comment_after.clone(), items))
                    }
                }
            })
            .collect()
    }
}

impl OptimizeDeadcode for Vec<Statement> {
    fn optimize(&self, used: &HashSet<String>) -> Self {
        self.iter()
            .filter_map(|stmt| match stmt {
                Statement::Conditional(cond, then_stmt) => {
                    let then_stmt = then_stmt.optimize(used);
                    if then_stmt.is_empty() {
                        None
                    } else {
                        Some(Statement::Conditional(cond.clone(), then_stmt))
                    }
                }
                Statement::NonblockingAssignment(lvalue, expr) => {
                    if used.contains(get_lvalue_ident(lvalue)) {
                        Some(Statement::NonblockingAssignment(lvalue.clone(), expr.clone()))
                    } else {
                        None
                    }
                }
            })
            .collect()
    }
}

/// Optimizes module by using dead code elimination.
///
/// Declarations and assignments whose identifier is never read are removed until nothing changes. Ports are always
/// considered read.
pub fn dead_code_opt(module: Module) -> Module {
    let port_decls = module.port_decls;
    let mut module_items = module.module_items;

    let mut relaxation = true;
    while relaxation {
        let mut used = port_decls.iter().map(|port_decl| port_decl.ident().to_string()).collect::<HashSet<_>>();
        module_items.walk(&mut used);

        let new_module_items = module_items.optimize(&used);
        relaxation = module_items != new_module_items;
        module_items = new_module_items;
    }

    Module { name: module.name, port_decls, module_items }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_unread_chain() {
        let module = Module {
            name: "top".to_string(),
            port_decls: vec![PortDeclaration::input(1, "a".to_string()), PortDeclaration::output(1, "q".to_string())],
            module_items: vec![
                ModuleItem::Declarations(vec![
                    Declaration::net(1, "t0".to_string()),
                    Declaration::net(1, "t1".to_string()),
                ]),
                ModuleItem::ContinuousAssigns(vec![
                    ContinuousAssign::new(Expression::ident("t0".to_string()), Expression::ident("a".to_string())),
                    ContinuousAssign::new(Expression::ident("t1".to_string()), Expression::ident("t0".to_string())),
                    ContinuousAssign::new(Expression::ident("q".to_string()), Expression::ident("a".to_string())),
                ]),
            ],
        };

        let module = dead_code_opt(module);
        assert_eq!(module.module_items, vec![ModuleItem::ContinuousAssigns(vec![ContinuousAssign::new(
            Expression::ident("q".to_string()),
            Expression::ident("a".to_string())
        )])]);
    }
}
