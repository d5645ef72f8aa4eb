//! Assistant system prompt

use crate::catalog::{Camp, CatalogProvider};

const PREAMBLE: &str = "You are a friendly and helpful Summer Camp assistant chatbot. \
You help parents and kids learn about our summer camp programs. Here are our camps:";

const GUIDANCE: &str = "Be enthusiastic, helpful, and encourage parents to register. \
Answer questions about schedules, safety, pricing, and activities. \
Keep responses concise and friendly.";

/// Render the system message the relay prepends to every conversation.
pub fn render_system_prompt(catalog: &dyn CatalogProvider) -> String {
    let mut prompt = String::from(PREAMBLE);
    prompt.push_str("\n\n");
    for camp in catalog.camps() {
        prompt.push_str(&camp_line(camp));
        prompt.push('\n');
    }
    prompt.push('\n');
    prompt.push_str(GUIDANCE);
    prompt
}

fn camp_line(camp: &Camp) -> String {
    let mut line = format!(
        "- **{}** ({}): {} for ages {}-{}, {} days",
        camp.name,
        format_inr(camp.price_inr),
        camp.highlights,
        camp.min_age,
        camp.max_age,
        camp.duration_days
    );
    if camp.best_value {
        line.push_str(" - BEST VALUE!");
    }
    line
}

/// Format rupees with Indian digit grouping, e.g. `₹1,50,000`.
pub fn format_inr(amount: u32) -> String {
    let digits = amount.to_string();
    if digits.len() <= 3 {
        return format!("₹{digits}");
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (front, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = front;
    }
    groups.push(rest);
    groups.reverse();

    format!("₹{},{}", groups.join(","), tail)
}
