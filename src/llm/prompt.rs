//! Prompt construction for generator requests.
//!
//! Builds the system prompt with schema context and few-shot examples.

use crate::db::SchemaRegistry;
use crate::llm::types::Message;

/// System prompt template for the SQL generator.
const SYSTEM_PROMPT_TEMPLATE: &str = r#"You translate questions about trades into a single SQLite query.

DATABASE SCHEMA:
{schema}
RULES:
- Use only the table '{table}' and the columns listed above.
- Output ONLY one SELECT statement. No explanations, no backticks.
- Never use DDL or DML (DROP, DELETE, UPDATE, INSERT, ALTER, CREATE, ATTACH, PRAGMA).
- Prefer explicit filters on ccy, counterparty and book when the question names them.
- If the question can return many rows, add a LIMIT (e.g. LIMIT 100).
- ts is stored as 'YYYY-MM-DD HH:MM:SS'; to filter by day use ts LIKE 'YYYY-MM-DD%'."#;

/// Worked question/answer pairs sent ahead of the user's question.
pub const FEW_SHOT_EXAMPLES: &[(&str, &str)] = &[
    (
        "How many EUR trades with Acme Corp?",
        "SELECT COUNT(*) FROM transactions WHERE ccy = 'EUR' AND counterparty = 'Acme Corp';",
    ),
    (
        "Show total amount per counterparty in USD.",
        "SELECT counterparty, SUM(amount) AS total_amount FROM transactions WHERE ccy = 'USD' GROUP BY counterparty;",
    ),
    (
        "List the 5 largest USD trades with Beta Bank.",
        "SELECT * FROM transactions WHERE ccy = 'USD' AND counterparty = 'Beta Bank' ORDER BY amount DESC LIMIT 5;",
    ),
];

/// Builds the system prompt with the schema description injected.
pub fn build_system_prompt(registry: &SchemaRegistry) -> String {
    SYSTEM_PROMPT_TEMPLATE
        .replace("{schema}", &registry.format_for_llm())
        .replace("{table}", registry.table_name())
}

/// Builds the complete message list for one generation request.
///
/// System prompt, then each few-shot pair as a user/assistant exchange, then
/// the question.
pub fn build_messages(registry: &SchemaRegistry, user_query: &str) -> Vec<Message> {
    let mut messages = Vec::with_capacity(FEW_SHOT_EXAMPLES.len() * 2 + 2);

    messages.push(Message::system(build_system_prompt(registry)));
    for (question, answer) in FEW_SHOT_EXAMPLES {
        messages.push(Message::user(*question));
        messages.push(Message::assistant(*answer));
    }
    messages.push(Message::user(user_query));

    messages
}
