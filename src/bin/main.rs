//! Expense agent demo binary
//!
//! Wires the router against the in-memory ledger and, when a Groq key
//! is present, the model interpreter. Feeds a handful of representative
//! messages through the pipeline and prints the replies.

use expense_agent::agent::MessageRouter;
use expense_agent::budget::BudgetEvaluator;
use expense_agent::config::AgentConfig;
use expense_agent::interpreter::ModelInterpreter;
use expense_agent::llm::GroqClient;
use expense_agent::search::{GoogleSearchClient, SearchProvider};
use expense_agent::sheet::InMemorySheet;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> expense_agent::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AgentConfig::from_env();

    let sheet = Arc::new(InMemorySheet::new());
    let budget = BudgetEvaluator::new(sheet.clone(), config.weekly_limit);

    let interpreter = config
        .groq_api_key
        .clone()
        .filter(|_| config.model_enabled)
        .map(|key| ModelInterpreter::new(Arc::new(GroqClient::new(key))));

    let search: Option<Arc<dyn SearchProvider>> = config
        .search_credentials()
        .map(|(key, cse)| Arc::new(GoogleSearchClient::new(key, cse)) as Arc<dyn SearchProvider>);

    let router = MessageRouter::new(sheet, budget, interpreter, search, config.qr.clone());

    info!("expense agent ready");

    let user_id = 1;
    let messages = [
        "phở 50k",
        "cơm 35k, trà đá 5k, xăng 200k",
        "nạp game 100k",
        "hôm nay trời đẹp quá",
    ];

    for message in messages {
        println!("\n> {message}");
        let reply = router.handle_message(user_id, message).await?;
        println!("{reply}");
    }

    Ok(())
}
