//! SQL normalization before comparison.
//!
//! Queries are parsed with a generic dialect, boolean conditions are
//! rewritten to conjunctive normal form, and the statement is printed back
//! in canonical form (upper-case keywords, single spaces). Two queries that
//! differ only in layout, keyword case, or `AND`/`OR` distribution compare
//! equal after this step.

use crate::types::{EvalError, Result};
use sqlparser::ast::{BinaryOperator, Expr, Statement, VisitMut, VisitorMut};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;
use std::ops::ControlFlow;

/// Upper bound on CNF clauses; larger expansions are left untouched.
pub const MAX_CNF_CLAUSES: usize = 128;

/// Parse the first statement in `sql`.
pub fn parse_statement(sql: &str) -> Result<Statement> {
    let mut statements = Parser::parse_sql(&GenericDialect {}, sql)?;
    if statements.is_empty() {
        return Err(EvalError::SqlParse(format!(
            "No statement was parsed from '{}'",
            sql
        )));
    }
    Ok(statements.swap_remove(0))
}

/// Parse and normalize the first statement in `sql`.
pub fn normalize_statement(sql: &str) -> Result<Statement> {
    let mut statement = parse_statement(sql)?;
    rewrite_to_cnf(&mut statement);
    Ok(statement)
}

/// Canonical text of the normalized statement.
///
/// # Examples
///
/// ```
/// use sqleval::eval::normalize_sql;
///
/// let sql = normalize_sql("select name from player where a = 1 or (b = 2 and c = 3)").unwrap();
/// assert_eq!(sql, "SELECT name FROM player WHERE (a = 1 OR b = 2) AND (a = 1 OR c = 3)");
/// ```
pub fn normalize_sql(sql: &str) -> Result<String> {
    Ok(normalize_statement(sql)?.to_string())
}

/// Rewrite every outermost `AND`/`OR` tree in the statement to CNF.
///
/// Connectives nested inside an already rewritten tree are left as they
/// are, so an oversized expansion leaves the whole tree untouched.
pub fn rewrite_to_cnf(statement: &mut Statement) {
    let _ = statement.visit(&mut CnfRewriter { depth: 0 });
}

struct CnfRewriter {
    /// Number of enclosing connectives
    depth: usize,
}

impl VisitorMut for CnfRewriter {
    type Break = ();

    fn pre_visit_expr(&mut self, expr: &mut Expr) -> ControlFlow<Self::Break> {
        if is_connective(expr) {
            if self.depth == 0 {
                if let Some(rewritten) = cnf_clauses(expr).and_then(build_conjunction) {
                    *expr = rewritten;
                }
            }
            if is_connective(expr) {
                self.depth += 1;
            }
        }
        ControlFlow::Continue(())
    }

    fn post_visit_expr(&mut self, expr: &mut Expr) -> ControlFlow<Self::Break> {
        if is_connective(expr) {
            self.depth = self.depth.saturating_sub(1);
        }
        ControlFlow::Continue(())
    }
}

fn is_connective(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::BinaryOp {
            op: BinaryOperator::And | BinaryOperator::Or,
            ..
        }
    )
}

/// Drop parentheses that only group a connective.
fn strip_grouping(mut expr: &Expr) -> &Expr {
    while let Expr::Nested(inner) = expr {
        if is_connective(inner) || matches!(inner.as_ref(), Expr::Nested(_)) {
            expr = inner;
        } else {
            break;
        }
    }
    expr
}

/// Conjunction of disjunctions, or `None` if it grows past the limit.
fn cnf_clauses(expr: &Expr) -> Option<Vec<Vec<Expr>>> {
    match strip_grouping(expr) {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            let mut clauses = cnf_clauses(left)?;
            clauses.extend(cnf_clauses(right)?);
            (clauses.len() <= MAX_CNF_CLAUSES).then_some(clauses)
        }
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Or,
            right,
        } => {
            let left = cnf_clauses(left)?;
            let right = cnf_clauses(right)?;
            if left.len() * right.len() > MAX_CNF_CLAUSES {
                return None;
            }

            let mut clauses = Vec::with_capacity(left.len() * right.len());
            for l in &left {
                for r in &right {
                    let mut clause = l.clone();
                    clause.extend(r.iter().cloned());
                    clauses.push(clause);
                }
            }
            Some(clauses)
        }
        atom => Some(vec![vec![atom.clone()]]),
    }
}

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

fn build_conjunction(clauses: Vec<Vec<Expr>>) -> Option<Expr> {
    let grouped = clauses.len() > 1;

    clauses
        .into_iter()
        .filter_map(|clause| {
            let disjunction = clause
                .into_iter()
                .reduce(|acc, e| binary(acc, BinaryOperator::Or, e))?;
            if grouped && clause_is_disjunction(&disjunction) {
                Some(Expr::Nested(Box::new(disjunction)))
            } else {
                Some(disjunction)
            }
        })
        .reduce(|acc, e| binary(acc, BinaryOperator::And, e))
}

fn clause_is_disjunction(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::BinaryOp {
            op: BinaryOperator::Or,
            ..
        }
    )
}
