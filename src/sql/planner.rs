/// Join planning.
///
/// Turns a bag of required tables plus a flat predicate pool into an ordered
/// `FROM ... JOIN ...` chain. Tables are placed greedily: the first table is
/// the FROM table, and every later table is joined on the first predicate in
/// pool order that equates one of its columns with a column of an already
/// placed table. That predicate is consumed as the ON condition; whatever is
/// never consumed stays behind, in order, as the WHERE clause.
///
/// Inner-joined tables are placed first, left-joinable tables last.
use tracing::debug;

use super::types::{Join, JoinChain, JoinType, Predicate, TableRef};
use crate::error::ComposeError;

/// Upper bound on placement passes over the pending tables.
pub const MAX_PASSES: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct JoinPlan {
    pub chain: JoinChain,
    /// Predicates not used as join conditions, in pool order.
    pub residual: Vec<Predicate>,
}

/// Plan the join chain for `tables`.
///
/// Tables whose alias appears in `left_joined` are deferred until every
/// other table is placed and are then attached with `LEFT JOIN`. A table set
/// that cannot be fully linked is a catalog defect and fails instead of
/// degrading into a cartesian product.
pub fn plan_joins(
    tables: Vec<TableRef>,
    left_joined: &[&str],
    pool: Vec<Predicate>,
) -> Result<JoinPlan, ComposeError> {
    let (mut pending, mut deferred): (Vec<TableRef>, Vec<TableRef>) = tables
        .into_iter()
        .partition(|t| !left_joined.contains(&t.alias.as_str()));

    let mut pool = pool;
    let mut placed: Vec<String> = Vec::new();
    let mut from: Option<TableRef> = None;
    let mut joins: Vec<Join> = Vec::new();
    let mut join_type = JoinType::Inner;
    let mut passes = 0;

    loop {
        if pending.is_empty() {
            if deferred.is_empty() {
                break;
            }
            pending = std::mem::take(&mut deferred);
            join_type = JoinType::Left;
        }

        passes += 1;
        if passes > MAX_PASSES {
            return Err(unlinkable(&pending));
        }

        let before = pending.len();
        let mut remaining = Vec::with_capacity(before);

        for table in pending.drain(..) {
            if from.is_none() {
                debug!(table = %table.name, alias = %table.alias, "placed FROM table");
                placed.push(table.alias.clone());
                from = Some(table);
                continue;
            }

            match take_join_condition(&mut pool, &table.alias, &placed) {
                Some(condition) => {
                    debug!(
                        table = %table.name,
                        alias = %table.alias,
                        ?join_type,
                        on = %condition,
                        "placed joined table"
                    );
                    placed.push(table.alias.clone());
                    joins.push(Join {
                        join_type,
                        table,
                        condition,
                    });
                }
                None => remaining.push(table),
            }
        }

        if !remaining.is_empty() && remaining.len() == before {
            return Err(unlinkable(&remaining));
        }
        pending = remaining;
    }

    let from = from.ok_or(ComposeError::EmptyTableSet)?;
    Ok(JoinPlan {
        chain: JoinChain { from, joins },
        residual: pool,
    })
}

/// Remove and return the first predicate linking `alias` to a placed table.
fn take_join_condition(
    pool: &mut Vec<Predicate>,
    alias: &str,
    placed: &[String],
) -> Option<Predicate> {
    let idx = pool.iter().position(|p| p.links(alias, placed))?;
    Some(pool.remove(idx))
}

fn unlinkable(tables: &[TableRef]) -> ComposeError {
    ComposeError::UnlinkableTables(tables.iter().map(|t| t.alias.clone()).collect())
}
