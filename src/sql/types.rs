//! Statement model for composed queries.
//!
//! Predicates are kept as small tagged structures rather than text so the
//! join planner can compare alias references structurally. Everything here
//! renders to SQL text through `Display` or the compiler.
use std::fmt;

/// Column reference: `qualifier.column` or just `column`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(qualifier: &str, name: &str) -> Self {
        Self {
            qualifier: Some(qualifier.to_string()),
            name: name.to_string(),
        }
    }

    /// Split `alias.column` at the first dot; a bare name stays unqualified.
    pub fn parse(text: &str) -> Self {
        match text.split_once('.') {
            Some((qualifier, name)) => Self::new(qualifier, name),
            None => Self {
                qualifier: None,
                name: text.to_string(),
            },
        }
    }

    pub fn is_qualified_by(&self, alias: &str) -> bool {
        self.qualifier.as_deref() == Some(alias)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(q) => write!(f, "{}.{}", q, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Literal values embedded in predicates.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Rendered verbatim. Only ever holds text that parsed as a number.
    Number(String),
    /// Rendered single-quoted with embedded quotes doubled.
    Text(String),
}

impl Literal {
    pub fn text(value: &str) -> Self {
        Literal::Text(value.to_string())
    }

    /// A value for a numeric column. Tokens that are not numbers are quoted
    /// so they can never be spliced into the statement as raw SQL.
    pub fn numeric(value: &str) -> Self {
        let token = value.trim();
        let is_number = token.parse::<f64>().is_ok_and(f64::is_finite)
            && token.bytes().all(|b| b.is_ascii_digit() || b"+-.eE".contains(&b));
        if is_number {
            Literal::Number(token.to_string())
        } else {
            Literal::Text(value.to_string())
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Text(s) => write!(f, "'{}'", escape_string(s)),
        }
    }
}

/// Double single quotes so the value can sit inside a `'...'` literal.
pub fn escape_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Literal(Literal),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Column(c) => write!(f, "{}", c),
            Operand::Literal(l) => write!(f, "{}", l),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    GtEq,
    LtEq,
}

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::NotEq => "!=",
            CompareOp::GtEq => ">=",
            CompareOp::LtEq => "<=",
        }
    }
}

/// One WHERE/ON condition.
///
/// Structural (foreign key) and filter predicates share this type and live
/// in the same pool; nothing records where a predicate came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `left <op> right`
    Compare {
        left: ColumnRef,
        op: CompareOp,
        right: Operand,
    },
    /// `column IN (v1,v2,...)`
    InList {
        column: ColumnRef,
        values: Vec<Literal>,
    },
    /// `(column & mask > 0)`
    BitwiseAny { column: ColumnRef, mask: Literal },
}

impl Predicate {
    /// Equi-join condition between two columns.
    pub fn join(left: ColumnRef, right: ColumnRef) -> Self {
        Predicate::Compare {
            left,
            op: CompareOp::Eq,
            right: Operand::Column(right),
        }
    }

    pub fn compare(left: ColumnRef, op: CompareOp, value: Literal) -> Self {
        Predicate::Compare {
            left,
            op,
            right: Operand::Literal(value),
        }
    }

    /// True when this is `alias.x = placed.y` or `placed.y = alias.x` for
    /// some alias in `placed`.
    pub fn links(&self, alias: &str, placed: &[String]) -> bool {
        let Predicate::Compare {
            left,
            op: CompareOp::Eq,
            right: Operand::Column(right),
        } = self
        else {
            return false;
        };
        let is_placed = |c: &ColumnRef| {
            c.qualifier
                .as_deref()
                .is_some_and(|q| placed.iter().any(|p| p == q))
        };
        (left.is_qualified_by(alias) && is_placed(right))
            || (is_placed(left) && right.is_qualified_by(alias))
    }

    /// The column the rendered text starts with, if the text starts with a
    /// column at all. Bitwise tests open with a parenthesis.
    pub fn leading_column_mut(&mut self) -> Option<&mut ColumnRef> {
        match self {
            Predicate::Compare { left, .. } => Some(left),
            Predicate::InList { column, .. } => Some(column),
            Predicate::BitwiseAny { .. } => None,
        }
    }

    /// Every alias this predicate references.
    pub fn qualifiers(&self) -> Vec<&str> {
        let mut out = Vec::new();
        match self {
            Predicate::Compare { left, right, .. } => {
                out.extend(left.qualifier.as_deref());
                if let Operand::Column(c) = right {
                    out.extend(c.qualifier.as_deref());
                }
            }
            Predicate::InList { column, .. } | Predicate::BitwiseAny { column, .. } => {
                out.extend(column.qualifier.as_deref());
            }
        }
        out
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Compare { left, op, right } => {
                write!(f, "{}{}{}", left, op.as_str(), right)
            }
            Predicate::InList { column, values } => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{} IN ({})", column, items.join(","))
            }
            Predicate::BitwiseAny { column, mask } => write!(f, "({} & {} > 0)", column, mask),
        }
    }
}

/// A select-list entry: `expr AS name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub expr: String,
    pub name: String,
}

impl Column {
    pub fn new(expr: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            name: name.into(),
        }
    }

    /// Aggregates never take part in GROUP BY.
    pub fn is_aggregate(&self) -> bool {
        let upper = self.expr.to_ascii_uppercase();
        ["SUM(", "MIN(", "MAX(", "COUNT(", "AVG("]
            .iter()
            .any(|f| upper.starts_with(f))
    }
}

/// Ordered select list. Insertion order is output order; an entry whose
/// expression or output name is already present is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Columns(Vec<Column>);

impl Columns {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, expr: &str, name: &str) {
        if self.0.iter().any(|c| c.expr == expr || c.name == name) {
            return;
        }
        self.0.push(Column::new(expr, name));
    }

    pub fn extend_pairs(&mut self, pairs: &[(&str, &str)]) {
        for (expr, name) in pairs {
            self.push(expr, name);
        }
    }

    pub fn extend_columns(&mut self, columns: &[Column]) {
        for c in columns {
            self.push(&c.expr, &c.name);
        }
    }

    pub fn remove_expr(&mut self, expr: &str) {
        self.0.retain(|c| c.expr != expr);
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.0.iter().any(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn exprs(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.expr.as_str()).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Physical table plus its per-query alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub name: String,
    pub alias: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: alias.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub condition: Predicate,
}

/// `FROM first [INNER|LEFT] JOIN ... ON (...)` in placement order.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinChain {
    pub from: TableRef,
    pub joins: Vec<Join>,
}

impl JoinChain {
    pub fn aliases(&self) -> Vec<&str> {
        std::iter::once(self.from.alias.as_str())
            .chain(self.joins.iter().map(|j| j.table.alias.as_str()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub columns: Columns,
    pub from: JoinChain,
    pub filter: Vec<Predicate>,
    pub group_by: Vec<String>,
}

/// Values written by UPDATE and INSERT.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => write!(f, "NULL"),
            FieldValue::Bool(b) => write!(f, "'{}'", if *b { 1 } else { 0 }),
            FieldValue::Integer(i) => write!(f, "'{}'", i),
            FieldValue::Float(x) => write!(f, "'{}'", x),
            FieldValue::Text(s) => write!(f, "'{}'", escape_string(s)),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Integer(i64::from(i))
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// Column -> value map in caller order. Setting a column twice keeps the
/// first position and the last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(Vec<(String, FieldValue)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, column: &str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        match self.0.iter_mut().find(|(c, _)| c == column) {
            Some(entry) => entry.1 = value,
            None => self.0.push((column.to_string(), value)),
        }
        self
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(c, _)| c.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, FieldValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStatement {
    pub table: TableRef,
    pub assignments: Fields,
    pub filter: Vec<Predicate>,
}

/// Multi-table delete. Every name here is a raw table name; the target
/// engine does not accept aliases in this form.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStatement {
    pub targets: Vec<String>,
    pub using: Vec<String>,
    pub filter: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStatement {
    pub table: String,
    pub fields: Fields,
    pub returning: Option<String>,
}
