/// Statement model → SQL text.
///
/// Output is compact and byte-stable: select-list items are joined with a
/// bare comma, predicates with ` AND `, and nothing is reordered. Composing
/// the same statement twice always yields identical text.
use super::types::*;

pub fn compile_select(select: &SelectStatement) -> String {
    let mut sql = String::from("SELECT ");

    let items: Vec<String> = select
        .columns
        .iter()
        .map(|c| format!("{} AS {}", c.expr, c.name))
        .collect();
    sql.push_str(&items.join(","));

    sql.push_str(&compile_join_chain(&select.from));
    sql.push_str(&compile_where(&select.filter));

    if !select.group_by.is_empty() {
        sql.push_str(" GROUP BY ");
        sql.push_str(&select.group_by.join(","));
    }

    sql
}

fn compile_join_chain(chain: &JoinChain) -> String {
    let mut s = format!(" FROM {}", compile_table_ref(&chain.from));
    for join in &chain.joins {
        s.push(' ');
        s.push_str(&compile_join(join));
    }
    s
}

fn compile_table_ref(table: &TableRef) -> String {
    format!("{} AS {}", table.name, table.alias)
}

fn compile_join(join: &Join) -> String {
    let type_str = match join.join_type {
        JoinType::Inner => "INNER JOIN",
        JoinType::Left => "LEFT JOIN",
    };
    format!(
        "{} {} ON ({})",
        type_str,
        compile_table_ref(&join.table),
        join.condition
    )
}

fn compile_where(filter: &[Predicate]) -> String {
    if filter.is_empty() {
        return String::new();
    }
    let parts: Vec<String> = filter.iter().map(|p| p.to_string()).collect();
    format!(" WHERE {}", parts.join(" AND "))
}

pub fn compile_update(update: &UpdateStatement) -> String {
    let sets: Vec<String> = update
        .assignments
        .iter()
        .map(|(column, value)| format!("{}={}", column, value))
        .collect();

    format!(
        "UPDATE {} SET {}{}",
        compile_table_ref(&update.table),
        sets.join(","),
        compile_where(&update.filter)
    )
}

pub fn compile_delete(delete: &DeleteStatement) -> String {
    format!(
        "DELETE FROM {} USING {}{}",
        delete.targets.join(", "),
        delete.using.join(", "),
        compile_where(&delete.filter)
    )
}

pub fn compile_insert(insert: &InsertStatement) -> String {
    let columns: Vec<&str> = insert.fields.columns().collect();
    let values: Vec<String> = insert.fields.iter().map(|(_, v)| v.to_string()).collect();

    let returning = match &insert.returning {
        Some(column) => format!(" RETURNING {}", column),
        None => String::new(),
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}){}",
        insert.table,
        columns.join(", "),
        values.join(", "),
        returning
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone_select() -> SelectStatement {
        let mut columns = Columns::new();
        columns.push("z.zoneid", "zone_id");
        columns.push("z.zonename", "name");
        SelectStatement {
            columns,
            from: JoinChain {
                from: TableRef::new("zones", "z"),
                joins: vec![Join {
                    join_type: JoinType::Inner,
                    table: TableRef::new("affiliates", "p"),
                    condition: Predicate::join(
                        ColumnRef::new("p", "affiliateid"),
                        ColumnRef::new("z", "affiliateid"),
                    ),
                }],
            },
            filter: vec![Predicate::compare(
                ColumnRef::new("p", "agencyid"),
                CompareOp::Eq,
                Literal::numeric("3"),
            )],
            group_by: vec![],
        }
    }

    #[test]
    fn test_compile_select_with_join() {
        assert_eq!(
            compile_select(&zone_select()),
            "SELECT z.zoneid AS zone_id,z.zonename AS name FROM zones AS z \
             INNER JOIN affiliates AS p ON (p.affiliateid=z.affiliateid) WHERE p.agencyid=3"
        );
    }

    #[test]
    fn test_compile_select_left_join_and_group_by() {
        let mut select = zone_select();
        select.from.joins[0].join_type = JoinType::Left;
        select.filter.clear();
        select.group_by = vec!["zone_id".into(), "name".into()];
        let sql = compile_select(&select);
        assert!(sql.contains(" LEFT JOIN affiliates AS p ON ("));
        assert!(!sql.contains("WHERE"));
        assert!(sql.ends_with(" GROUP BY zone_id,name"));
    }

    #[test]
    fn test_compile_update() {
        let update = UpdateStatement {
            table: TableRef::new("campaigns", "m"),
            assignments: Fields::new().set("campaignname", "Bob's").set("weight", 2),
            filter: vec![Predicate::compare(
                ColumnRef::new("m", "campaignid"),
                CompareOp::Eq,
                Literal::numeric("7"),
            )],
        };
        assert_eq!(
            compile_update(&update),
            "UPDATE campaigns AS m SET campaignname='Bob''s',weight='2' WHERE m.campaignid=7"
        );
    }

    #[test]
    fn test_compile_update_without_filter() {
        let update = UpdateStatement {
            table: TableRef::new("agency", "g"),
            assignments: Fields::new().set("active", FieldValue::Null),
            filter: vec![],
        };
        assert_eq!(compile_update(&update), "UPDATE agency AS g SET active=NULL");
    }

    #[test]
    fn test_compile_delete() {
        let delete = DeleteStatement {
            targets: vec!["ad_zone_assoc".into()],
            using: vec!["ad_zone_assoc".into(), "zones".into()],
            filter: vec![Predicate::compare(
                ColumnRef::new("zones", "affiliateid"),
                CompareOp::Eq,
                Literal::numeric("4"),
            )],
        };
        assert_eq!(
            compile_delete(&delete),
            "DELETE FROM ad_zone_assoc USING ad_zone_assoc, zones WHERE zones.affiliateid=4"
        );
    }

    #[test]
    fn test_compile_insert() {
        let insert = InsertStatement {
            table: "category".into(),
            fields: Fields::new().set("name", "Sports"),
            returning: Some("category_id".into()),
        };
        assert_eq!(
            compile_insert(&insert),
            "INSERT INTO category (name) VALUES ('Sports') RETURNING category_id"
        );
    }

    #[test]
    fn test_compiled_select_parses() {
        use sqlparser::dialect::MySqlDialect;
        use sqlparser::parser::Parser;

        let sql = compile_select(&zone_select());
        let parsed = Parser::parse_sql(&MySqlDialect {}, &sql);
        assert!(parsed.is_ok(), "{} -> {:?}", sql, parsed.err());
    }
}
