//! Expense Agent
//!
//! Conversational expense tracker for Vietnamese chat messages. A
//! two-tier interpreter turns free text into structured expenses: the
//! model-based tier handles arbitrary phrasing, intent classification
//! and backdated entries, and a deterministic rule-based parser covers
//! every failure of the first tier so the agent keeps working with no
//! API key at all.
//!
//! Around the pipeline sit the supporting pieces of a personal finance
//! assistant: a spreadsheet-shaped ledger behind the [`sheet::LedgerStore`]
//! trait, weekly budget tracking, bill splitting, VietQR payment links,
//! web search, daily reminders and per-user conversation memory.

pub mod agent;
pub mod budget;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod llm;
pub mod memory;
pub mod models;
pub mod parser;
pub mod qr;
pub mod reminder;
pub mod search;
pub mod sheet;
pub mod split;

pub use error::{AgentError, Result};
pub use models::{Category, ExpenseDraft, ExpenseRecord, IntentResult};
