//! Static schema knowledge: entity kinds, logical tables, their columns and
//! the rules that turn request parameters into tables and filters.
mod catalog;
mod columns;
mod kind;
mod limitations;
mod params;
mod table;
mod tables;

pub use catalog::{structural_joins, Relation, RELATIONS};
pub use columns::{columns, group_columns, stats_columns, ENTITY_KEYS};
pub use kind::EntityKind;
pub use limitations::{add_limitation, limitations, stats_limitations, LimitationMode};
pub use params::{ParamValue, Params};
pub use table::{Table, Tables};
pub use tables::{left_joined_tables, primary_table, rollup_table, tables};
