use model_pricing::pricing::Resolved;
use model_pricing::{CostBreakdown, UsageSnapshot};

use super::format::{create_styled_table, format_cost, format_rate, header_cell, right_cell};

pub(crate) fn print_cost_table(model: &str, usage: &UsageSnapshot, cost: &CostBreakdown) {
    if !cost.has_pricing {
        println!("No pricing found for {model}");
        return;
    }

    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Item"),
        header_cell("Tokens"),
        header_cell("Cost (USD)"),
    ]);

    let (cache_5m, cache_1h) = usage.cache_creation_split();
    let input_label = if cost.is_long_context {
        "Input (1M context)"
    } else {
        "Input"
    };

    let rows = [
        (input_label, usage.input_tokens, cost.input_cost),
        ("Output", usage.output_tokens, cost.output_cost),
        ("Cache write 5m", cache_5m, cost.ephemeral_5m_cost),
        ("Cache write 1h", cache_1h, cost.ephemeral_1h_cost),
        ("Cache read", usage.cache_read_tokens, cost.cache_read_cost),
    ];
    for (label, tokens, amount) in rows {
        table.add_row(vec![
            comfy_table::Cell::new(label),
            right_cell(&tokens.to_string(), false),
            right_cell(&format_cost(amount), false),
        ]);
    }
    table.add_row(vec![
        header_cell("Total"),
        right_cell("", false),
        right_cell(&format_cost(cost.total_cost), true),
    ]);

    println!("\n  {model}\n");
    println!("{table}");
}

pub(crate) fn print_resolve_table(model: &str, resolved: Option<Resolved<'_>>) {
    let Some(hit) = resolved else {
        println!("No pricing found for {model}");
        return;
    };

    let entry = hit.entry;
    let mut table = create_styled_table();
    table.set_header(vec![header_cell("Rate"), header_cell("USD")]);
    let rows = [
        ("Input", entry.input_cost_per_token),
        ("Output", entry.output_cost_per_token),
        ("Cache write", entry.cache_creation_input_token_cost),
        ("Cache write >1h", entry.cache_creation_input_token_cost_above_1hr),
        ("Cache read", entry.cache_read_input_token_cost),
        ("Input >200k", entry.input_cost_per_token_above_200k_tokens),
        ("Output >200k", entry.output_cost_per_token_above_200k_tokens),
    ];
    for (label, rate) in rows {
        table.add_row(vec![
            comfy_table::Cell::new(label),
            right_cell(&format_rate(rate), false),
        ]);
    }

    println!("\n  {model} -> {}\n", hit.key);
    println!("{table}");
}
