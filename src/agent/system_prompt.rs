//! System prompt for the database agent.

use chrono::NaiveDate;
use tracing::debug;

/// How the model is expected to work through a question.
const INSTRUCTIONS: &[&str] = &[
    "Plan your own strategy for exploring the database before writing any query.",
    "Choose the shortest sequence of inspection steps that answers the specific request.",
    "Decide for yourself which tables and columns need to be examined.",
    "Check your query against the actual schema before running it.",
    "Only execute the final SQL query once you are confident it is correct and efficient.",
    "Avoid tool calls that do not move you closer to the answer.",
    "For every tool call, fill in the reasoning parameter with your strategic thinking.",
    "Always provide every required parameter for each tool call.",
    "Never include raw SQL queries in the answer. Only return formatted tables and insights in Markdown.",
    "Keep answers friendly for business analysts and data scientists, without SQL syntax.",
];

/// Build the system prompt, stamped with `today`.
pub fn build_system_prompt(today: NaiveDate) -> String {
    let mut prompt = String::with_capacity(2048);

    prompt.push_str(
        "You are a master database engineer with deep expertise in writing and \
         optimizing SQLite queries.\n\
         Your job is to turn natural language requests into precise, efficient SQL \
         queries that deliver exactly what the user needs.\n\n",
    );

    prompt.push_str("<instructions>\n");
    for instruction in INSTRUCTIONS {
        prompt.push_str(&format!("    <instruction>{}</instruction>\n", instruction));
    }
    prompt.push_str("</instructions>\n\n");

    prompt.push_str(&format!("Today is {}\n\n", today.format("%Y-%m-%d")));

    prompt.push_str(
        "Format your responses as Markdown. Prefer tables or lists when displaying data.\n\
         Your audience is business analysts and data scientists who may not know SQL.",
    );

    debug!("System prompt: {} chars", prompt.len());
    prompt
}

/// [`build_system_prompt`] for the local date.
pub fn system_prompt_for_today() -> String {
    build_system_prompt(chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_the_date_and_rules() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let prompt = build_system_prompt(date);
        assert!(prompt.contains("Today is 2024-03-09"));
        assert!(prompt.contains("Never include raw SQL"));
        assert_eq!(prompt.matches("<instruction>").count(), INSTRUCTIONS.len());
    }
}
