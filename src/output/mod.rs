mod format;
mod json;
mod table;

pub(crate) use json::{cost_json, resolve_json};
pub(crate) use table::{print_cost_table, print_resolve_table};
