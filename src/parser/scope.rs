//! Static name-binding analysis for function bodies
//!
//! A name is local to a function when the body binds it anywhere (assignment,
//! augmented assignment, `for` target, `def`, `class`, `except ... as`, `del`)
//! and it is not declared `global` or `nonlocal`. Nested function and class
//! bodies are separate scopes and are not descended into; comprehension
//! variables are private to the comprehension.

use super::ast::{Expr, FunctionBody, Param, Stmt, StmtKind, Target};
use rustc_hash::FxHashSet;

#[derive(Debug, Default)]
pub struct ScopeInfo {
    pub local_names: FxHashSet<String>,
    pub global_names: FxHashSet<String>,
    pub nonlocal_names: FxHashSet<String>,
}

/// Compute the binding sets for a function with the given parameters and body.
pub fn analyze(params: &[Param], body: &FunctionBody) -> ScopeInfo {
    let mut info = ScopeInfo::default();
    for param in params {
        info.local_names.insert(param.name.clone());
    }
    if let FunctionBody::Block(stmts) = body {
        collect_block(stmts, &mut info);
    }
    for name in info.global_names.iter().chain(info.nonlocal_names.iter()) {
        info.local_names.remove(name);
    }
    info
}

fn collect_block(stmts: &[Stmt], info: &mut ScopeInfo) {
    for stmt in stmts {
        collect_stmt(stmt, info);
    }
}

fn collect_stmt(stmt: &Stmt, info: &mut ScopeInfo) {
    match &stmt.kind {
        StmtKind::Assign { targets, .. } => {
            for target in targets {
                collect_target(target, info);
            }
        }
        StmtKind::AugAssign { target, .. } => collect_target(target, info),
        StmtKind::Del(targets) => {
            for target in targets {
                collect_target(target, info);
            }
        }
        StmtKind::For { target, body, .. } => {
            collect_target(target, info);
            collect_block(body, info);
        }
        StmtKind::While { body, .. } => collect_block(body, info),
        StmtKind::If {
            branches,
            else_body,
        } => {
            for branch in branches {
                collect_block(&branch.body, info);
            }
            if let Some(body) = else_body {
                collect_block(body, info);
            }
        }
        StmtKind::Try {
            body,
            handlers,
            else_body,
            finally_body,
        } => {
            collect_block(body, info);
            for handler in handlers {
                if let Some(name) = &handler.name {
                    info.local_names.insert(name.clone());
                }
                collect_block(&handler.body, info);
            }
            for block in [else_body, finally_body].into_iter().flatten() {
                collect_block(block, info);
            }
        }
        StmtKind::FunctionDef(code) => {
            info.local_names.insert(code.name.clone());
        }
        StmtKind::ClassDef { name, .. } => {
            info.local_names.insert(name.clone());
        }
        StmtKind::Global(names) => info.global_names.extend(names.iter().cloned()),
        StmtKind::Nonlocal(names) => info.nonlocal_names.extend(names.iter().cloned()),
        StmtKind::Expr(_)
        | StmtKind::Break
        | StmtKind::Continue
        | StmtKind::Pass
        | StmtKind::Return(_)
        | StmtKind::Raise(_)
        | StmtKind::Assert { .. } => {}
    }
}

fn collect_target(target: &Target, info: &mut ScopeInfo) {
    match target {
        Target::Name(name) => {
            info.local_names.insert(name.clone());
        }
        Target::Tuple(items) => {
            for item in items {
                collect_target(item, info);
            }
        }
        Target::Attribute { .. } | Target::Subscript { .. } => {}
    }
}

/// Names bound by a target, in left-to-right order.
pub fn target_names(target: &Target, out: &mut Vec<String>) {
    match target {
        Target::Name(name) => out.push(name.clone()),
        Target::Tuple(items) => {
            for item in items {
                target_names(item, out);
            }
        }
        Target::Attribute { .. } | Target::Subscript { .. } => {}
    }
}

/// Convert a parsed expression into an assignment target.
pub fn expr_to_target(expr: Expr) -> Option<Target> {
    match expr {
        Expr::Name(name) => Some(Target::Name(name)),
        Expr::Attribute { value, name } => Some(Target::Attribute {
            value: *value,
            name,
        }),
        Expr::Subscript { value, index } => Some(Target::Subscript {
            value: *value,
            index: *index,
        }),
        Expr::Tuple(items) | Expr::List(items) => items
            .into_iter()
            .map(expr_to_target)
            .collect::<Option<Vec<_>>>()
            .map(Target::Tuple),
        _ => None,
    }
}
