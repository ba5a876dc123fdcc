/// Entity requests → statement models.
///
/// ```text
/// EntityQuery ─► schema::{tables, columns, limitations}
///                      │
///                      ▼ filters first, then structural joins
///               predicate pool ─► plan_joins ─► SelectStatement
/// ```
///
/// Mutations skip the schema layer: callers name tables and predicates
/// directly, and `delete` rewrites them for the alias-free multi-table form.
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::BuilderConfig;
use crate::error::ComposeError;
use crate::schema::{self, EntityKind, Params, Table, Tables};
use crate::sql::{
    plan_joins, Columns, DeleteStatement, Fields, Predicate, SelectStatement, TableRef,
    UpdateStatement,
};

/// One entity request.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    pub kind: EntityKind,
    pub params: Params,
    pub all_fields: bool,
    pub include_stats: bool,
}

impl EntityQuery {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            params: Params::new(),
            all_fields: false,
            include_stats: false,
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<schema::ParamValue>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn all_fields(mut self, all_fields: bool) -> Self {
        self.all_fields = all_fields;
        self
    }

    pub fn include_stats(mut self, include_stats: bool) -> Self {
        self.include_stats = include_stats;
        self
    }
}

/// Compose the SELECT for an entity request.
pub fn compose_select(
    query: &EntityQuery,
    config: &BuilderConfig,
) -> Result<SelectStatement, ComposeError> {
    let kind = query.kind;
    let params = &query.params;
    let tables = schema::tables(kind, params, query.include_stats)?;
    let mut columns = schema::columns(kind, params, query.all_fields, config);
    let mut filters = schema::limitations(kind, params);

    let group_by = if query.include_stats && kind.stats_key().is_some() {
        let group_by: Vec<String> = columns
            .iter()
            .filter(|c| !c.is_aggregate())
            .map(|c| c.name.clone())
            .collect();
        for column in schema::stats_columns(kind).iter() {
            columns.push(&column.expr, &column.name);
        }
        for predicate in schema::stats_limitations(kind, params) {
            if !filters.contains(&predicate) {
                filters.push(predicate);
            }
        }
        group_by
    } else {
        schema::group_columns(kind, params)
    };

    let left_joined = schema::left_joined_tables(kind, params);
    select(columns, &tables, filters, group_by, &left_joined, config)
}

/// Plan and assemble a SELECT.
///
/// Structural joins for `tables` are appended to `filters` to form the
/// predicate pool. Tables in `left_joined` are attached last with LEFT JOIN
/// when they are required at all.
pub fn select(
    columns: Columns,
    tables: &Tables,
    filters: Vec<Predicate>,
    group_by: Vec<String>,
    left_joined: &[Table],
    config: &BuilderConfig,
) -> Result<SelectStatement, ComposeError> {
    let mut pool = filters;
    pool.extend(schema::structural_joins(tables));

    let deferred: Vec<&str> = left_joined
        .iter()
        .filter_map(|t| tables.alias_of(*t))
        .collect();

    let plan = plan_joins(tables.table_refs(config), &deferred, pool)?;
    Ok(SelectStatement {
        columns,
        from: plan.chain,
        filter: plan.residual,
        group_by,
    })
}

/// `UPDATE table AS alias SET ... [WHERE ...]`.
pub fn update(
    table: Table,
    fields: &Fields,
    filter: Vec<Predicate>,
    config: &BuilderConfig,
) -> Result<UpdateStatement, ComposeError> {
    if fields.is_empty() {
        return Err(ComposeError::EmptyAssignments);
    }
    Ok(UpdateStatement {
        table: TableRef::new(config.table_name(table), table.alias()),
        assignments: fields.clone(),
        filter,
    })
}

/// Alias ↔ raw table name for one statement.
#[derive(Debug, Clone, Default)]
pub struct AliasRegistry(BTreeMap<&'static str, String>);

impl AliasRegistry {
    pub fn register(&mut self, tables: &Tables, config: &BuilderConfig) {
        for (table, alias) in tables.iter() {
            self.0.insert(alias, config.table_name(*table));
        }
    }

    pub fn resolve(&self, alias: &str) -> Option<&str> {
        self.0.get(alias).map(String::as_str)
    }
}

/// Multi-table DELETE over the raw table names of `tables`.
///
/// `other` lists tables the predicates need but that are not themselves
/// deleted from. Only a predicate's leading column is requalified with the
/// raw table name. A statement with no predicates is refused.
pub fn delete(
    tables: &Tables,
    filter: &[Predicate],
    other: Option<&Tables>,
    config: &BuilderConfig,
) -> Result<DeleteStatement, ComposeError> {
    if tables.is_empty() {
        return Err(ComposeError::NoDeleteTargets);
    }

    let mut registry = AliasRegistry::default();
    registry.register(tables, config);

    let targets: Vec<String> = tables
        .iter()
        .map(|(t, _)| config.table_name(*t))
        .collect();
    let mut using = targets.clone();
    if let Some(other) = other {
        registry.register(other, config);
        for (t, _) in other.iter() {
            let name = config.table_name(*t);
            if !using.contains(&name) {
                using.push(name);
            }
        }
    }

    let rewritten: Vec<Predicate> = filter
        .iter()
        .cloned()
        .map(|mut p| {
            if let Some(column) = p.leading_column_mut() {
                let raw = column
                    .qualifier
                    .as_deref()
                    .and_then(|alias| registry.resolve(alias))
                    .map(String::from);
                if raw.is_some() {
                    column.qualifier = raw;
                }
            }
            p
        })
        .collect();

    if rewritten.is_empty() {
        warn!(targets = %targets.join(", "), "refusing DELETE without a WHERE clause");
        return Err(ComposeError::EmptyWhereClause);
    }

    debug!(targets = %targets.join(", "), predicates = rewritten.len(), "composed DELETE");
    Ok(DeleteStatement {
        targets,
        using,
        filter: rewritten,
    })
}
