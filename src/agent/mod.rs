//! Message router
//!
//! Entry point for every inbound chat message. Tier 1 is the model
//! interpreter; any Tier 1 failure that is not a hard bug falls back to
//! the rule-based parser, so the user gets an answer even with no API
//! key, an exhausted quota, or garbage model output. Both tiers feed
//! the same dispatch path, which keeps replies byte-identical
//! regardless of which tier understood the message.

use crate::budget::BudgetEvaluator;
use crate::error::{AgentError, Result};
use crate::interpreter::ModelInterpreter;
use crate::memory::MemoryStore;
use crate::models::{ExpenseRecord, IntentResult, WeeklyBudgetSnapshot};
use crate::parser;
use crate::qr::QrConfig;
use crate::search::SearchProvider;
use crate::sheet::LedgerStore;
use chrono::{Datelike, Local, Weekday};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Budget share, in percent, that triggers the early-week caution.
const EARLY_WEEK_CAUTION_PERCENT: f64 = 80.0;

const GUIDANCE_MESSAGE: &str = "❓ Mình chưa hiểu khoản chi nào trong tin nhắn. \
Hãy nhắn kèm số tiền, ví dụ:\n\
  - phở 50k\n\
  - xăng 200k\n\
  - cơm 35k, trà đá 5k\n\
Bạn cũng có thể hỏi về chi tiêu của mình hoặc nhờ mình tra cứu thông tin.";

const LEDGER_WRITE_FAILURE_MESSAGE: &str =
    "😥 Có lỗi khi ghi vào sổ, khoản chi chưa được lưu. Bạn thử lại sau nhé!";

const SEARCH_FAILURE_MESSAGE: &str =
    "😥 Tra cứu đang gặp sự cố, bạn thử lại sau nhé!";

pub struct MessageRouter {
    ledger: Arc<dyn LedgerStore>,
    budget: BudgetEvaluator,
    interpreter: Option<ModelInterpreter>,
    tier1_enabled: bool,
    search: Option<Arc<dyn SearchProvider>>,
    qr: QrConfig,
    memory: MemoryStore,
}

impl MessageRouter {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        budget: BudgetEvaluator,
        interpreter: Option<ModelInterpreter>,
        search: Option<Arc<dyn SearchProvider>>,
        qr: QrConfig,
    ) -> Self {
        let tier1_enabled = interpreter.is_some();
        Self {
            ledger,
            budget,
            interpreter,
            tier1_enabled,
            search,
            qr,
            memory: MemoryStore::new(),
        }
    }

    /// Administrative switch for the model path; the rule parser keeps
    /// working either way.
    pub fn set_tier1_enabled(&mut self, enabled: bool) {
        self.tier1_enabled = enabled && self.interpreter.is_some();
    }

    /// Route one inbound message to a reply. Never returns a user-facing
    /// error for parse failures; those become the guidance reply.
    pub async fn handle_message(&self, user_id: i64, text: &str) -> Result<String> {
        let intent = self.interpret_message(user_id, text).await;

        let reply = match intent {
            Ok(intent) => self.dispatch(intent).await?,
            Err(AgentError::NoExpenseFound) => GUIDANCE_MESSAGE.to_string(),
            Err(e) => return Err(e),
        };

        self.memory.append_exchange(user_id, text, &reply).await;
        Ok(reply)
    }

    /// Tier 1 when configured and enabled, rule parser otherwise or on
    /// any fallback-eligible Tier 1 failure.
    async fn interpret_message(&self, user_id: i64, text: &str) -> Result<IntentResult> {
        if self.tier1_enabled {
            if let Some(interpreter) = &self.interpreter {
                let now = Local::now().naive_local();
                let context = match self.budget.financial_context().await {
                    Ok(context) => context,
                    Err(e) => {
                        warn!(error = %e, "financial context unavailable, using defaults");
                        self.budget.default_context(now)
                    }
                };
                let history = self.memory.formatted_history(user_id).await;

                match interpreter.interpret(text, &context, &history).await {
                    Ok(intent) => {
                        info!(user_id, "message interpreted by model");
                        return Ok(intent);
                    }
                    Err(e) if e.triggers_fallback() => {
                        warn!(user_id, error = %e, "model interpreter failed, using rule parser");
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        let items = parser::parse_message(text)?;
        info!(user_id, item_count = items.len(), "message parsed by rules");
        Ok(IntentResult::Expense { items, note: None })
    }

    async fn dispatch(&self, intent: IntentResult) -> Result<String> {
        match intent {
            IntentResult::Expense { items, note } => self.record_expenses(items, note).await,
            // Search has no fallback tier: a transport failure becomes
            // the generic apology, never a raw error.
            IntentResult::Search { query } => match self.run_search(&query).await {
                Ok(reply) => Ok(reply),
                Err(e) => {
                    error!(error = %e, "search collaborator failed");
                    Ok(SEARCH_FAILURE_MESSAGE.to_string())
                }
            },
            IntentResult::PaymentRequest { amount, memo } => {
                let url = self.qr.build_payment_image_url(amount, &memo);
                Ok(format!(
                    "🧾 Mã QR nhận {amount}đ ({memo}):\n{url}"
                ))
            }
            IntentResult::Conversation { reply } => Ok(reply),
        }
    }

    async fn record_expenses(
        &self,
        items: Vec<crate::models::ExpenseDraft>,
        note: Option<String>,
    ) -> Result<String> {
        let now = Local::now().naive_local();
        let records: Vec<ExpenseRecord> =
            items.into_iter().map(|draft| draft.into_record(now)).collect();

        let warning = records
            .iter()
            .find_map(|r| parser::wasteful::wasteful_warning(&r.item));

        if let Err(e) = self.ledger.append_records(&records).await {
            error!(error = %e, "ledger append failed");
            return Ok(LEDGER_WRITE_FAILURE_MESSAGE.to_string());
        }

        // The write succeeded; a failed budget read only costs the
        // standing line, never the confirmation.
        let snapshot = match self.budget.weekly_snapshot().await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(error = %e, "weekly snapshot unavailable after write");
                None
            }
        };

        Ok(compose_expense_reply(
            &records,
            note,
            warning,
            snapshot.as_ref(),
            now.date().weekday(),
        ))
    }

    async fn run_search(&self, query: &str) -> Result<String> {
        let Some(search) = &self.search else {
            return Ok("🔎 Tính năng tra cứu chưa được cấu hình.".to_string());
        };

        let hits = search.search(query, 3).await?;
        if hits.is_empty() {
            return Ok(format!("🔎 Không tìm thấy kết quả nào cho \"{query}\"."));
        }

        let mut lines = vec![format!("🔎 Kết quả cho \"{query}\":")];
        for (i, hit) in hits.iter().enumerate() {
            lines.push(format!("{}. {}\n{}\n{}", i + 1, hit.title, hit.snippet, hit.link));
        }
        Ok(lines.join("\n\n"))
    }
}

/// One reply covering every recorded item plus the budget standing.
fn compose_expense_reply(
    records: &[ExpenseRecord],
    note: Option<String>,
    warning: Option<&str>,
    snapshot: Option<&WeeklyBudgetSnapshot>,
    weekday: Weekday,
) -> String {
    let mut lines = Vec::new();

    for record in records {
        lines.push(format!(
            "✅ Đã ghi: {} - {}đ ({})",
            record.item,
            record.amount,
            record.category.label()
        ));
    }

    if let Some(note) = note {
        lines.push(format!("📝 {note}"));
    }

    if let Some(warning) = warning {
        lines.push(warning.to_string());
    }

    if let Some(snapshot) = snapshot {
        lines.push(format!(
            "📊 Tuần này: đã tiêu {}đ, còn lại {}đ.",
            snapshot.total_spent, snapshot.remaining
        ));

        if snapshot.remaining < 0 {
            lines.push(format!(
                "🚨 BÁO ĐỘNG: Bạn đã vượt ngân sách tuần {}đ!",
                -snapshot.remaining
            ));
        }
        // Independent of the alarm: an over-budget Tuesday gets both.
        if snapshot.percent_used >= EARLY_WEEK_CAUTION_PERCENT
            && weekday.num_days_from_monday() <= Weekday::Thu.num_days_from_monday()
        {
            lines.push(format!(
                "⚠️ Mới đầu tuần mà đã dùng {:.0}% ngân sách, chậm lại nhé!",
                snapshot.percent_used
            ));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::ModelInterpreter;
    use crate::llm::LlmClient;
    use crate::models::Category;
    use crate::sheet::InMemorySheet;
    use chrono::NaiveDate;

    struct CannedLlm {
        response: String,
    }

    #[async_trait::async_trait]
    impl LlmClient for CannedLlm {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Ok(self.response.clone())
        }
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl LlmClient for FailingLlm {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String> {
            Err(AgentError::QuotaExceeded("rate limited".to_string()))
        }
    }

    fn router_with(llm: Option<Arc<dyn LlmClient>>) -> (MessageRouter, Arc<InMemorySheet>) {
        let sheet = Arc::new(InMemorySheet::new());
        let budget = BudgetEvaluator::new(sheet.clone(), 700_000);
        let interpreter = llm.map(ModelInterpreter::new);
        let router = MessageRouter::new(
            sheet.clone(),
            budget,
            interpreter,
            None,
            QrConfig::default(),
        );
        (router, sheet)
    }

    #[tokio::test]
    async fn test_rule_parser_path_records_and_reports() {
        let (router, sheet) = router_with(None);

        let reply = router.handle_message(1, "phở 50k").await.unwrap();
        assert!(reply.contains("Đã ghi: phở - 50000đ (Ăn uống)"));
        assert!(reply.contains("còn lại 650000đ"));

        let rows = sheet.read_all().await.unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn test_model_expense_intent_recorded() {
        let llm = Arc::new(CannedLlm {
            response: r#"{"type": "expense", "items": [
                {"item": "trà sữa", "amount": 45000, "category": "Ăn uống"}
            ], "note": null}"#
                .to_string(),
        });
        let (router, sheet) = router_with(Some(llm));

        let reply = router.handle_message(1, "mới uống trà sữa 45k").await.unwrap();
        assert!(reply.contains("trà sữa - 45000đ"));
        // Blocklist item also draws a caution line before the budget.
        assert!(reply.lines().count() >= 3);

        let rows = sheet.read_all().await.unwrap();
        assert_eq!(rows[1].entry().unwrap().amount, 45_000);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_rules() {
        let (router, sheet) = router_with(Some(Arc::new(FailingLlm)));

        let reply = router.handle_message(1, "xăng 200k").await.unwrap();
        assert!(reply.contains("xăng - 200000đ (Di chuyển)"));
        assert_eq!(sheet.read_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_garbage_model_output_falls_back_to_rules() {
        let llm = Arc::new(CannedLlm {
            response: "chắc chắn rồi! đây là JSON của bạn".to_string(),
        });
        let (router, _) = router_with(Some(llm));

        let reply = router.handle_message(1, "cơm 35k").await.unwrap();
        assert!(reply.contains("cơm - 35000đ"));
    }

    #[tokio::test]
    async fn test_fallback_reply_matches_pure_rule_reply() {
        let (with_failing_model, _) = router_with(Some(Arc::new(FailingLlm)));
        let (rules_only, _) = router_with(None);

        let a = with_failing_model.handle_message(1, "phở 50k").await.unwrap();
        let b = rules_only.handle_message(1, "phở 50k").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_unparseable_message_gets_guidance() {
        let (router, sheet) = router_with(None);

        let reply = router.handle_message(1, "hôm nay trời đẹp quá").await.unwrap();
        assert!(reply.contains("phở 50k"));
        assert_eq!(sheet.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_conversation_intent_returns_model_reply() {
        let llm = Arc::new(CannedLlm {
            response: r#"{"type": "conversation", "reply": "Hôm nay bạn tiêu 0đ."}"#.to_string(),
        });
        let (router, _) = router_with(Some(llm));

        let reply = router.handle_message(1, "hôm nay tiêu bao nhiêu?").await.unwrap();
        assert_eq!(reply, "Hôm nay bạn tiêu 0đ.");
    }

    #[tokio::test]
    async fn test_payment_request_returns_qr_link() {
        let llm = Arc::new(CannedLlm {
            response: r#"{"type": "payment_request", "amount": 150000, "memo": "tien an"}"#
                .to_string(),
        });
        let (router, _) = router_with(Some(llm));

        let reply = router.handle_message(1, "cho xin mã QR 150k tiền ăn").await.unwrap();
        assert!(reply.contains("img.vietqr.io"));
        assert!(reply.contains("amount=150000"));
    }

    #[tokio::test]
    async fn test_search_unconfigured_message() {
        let llm = Arc::new(CannedLlm {
            response: r#"{"type": "search", "query": "giá xăng hôm nay"}"#.to_string(),
        });
        let (router, _) = router_with(Some(llm));

        let reply = router.handle_message(1, "giá xăng bao nhiêu?").await.unwrap();
        assert!(reply.contains("chưa được cấu hình"));
    }

    #[tokio::test]
    async fn test_search_transport_failure_becomes_apology() {
        use crate::search::{SearchHit, SearchProvider};

        struct BrokenSearch;

        #[async_trait::async_trait]
        impl SearchProvider for BrokenSearch {
            async fn search(&self, _query: &str, _n: usize) -> Result<Vec<SearchHit>> {
                Err(AgentError::ExternalCall("search transport down".to_string()))
            }
        }

        let llm = Arc::new(CannedLlm {
            response: r#"{"type": "search", "query": "giá xăng hôm nay"}"#.to_string(),
        });
        let sheet = Arc::new(InMemorySheet::new());
        let budget = BudgetEvaluator::new(sheet.clone(), 700_000);
        let router = MessageRouter::new(
            sheet,
            budget,
            Some(ModelInterpreter::new(llm)),
            Some(Arc::new(BrokenSearch)),
            QrConfig::default(),
        );

        let reply = router.handle_message(1, "giá xăng bao nhiêu?").await.unwrap();
        assert!(reply.contains("thử lại sau"));
    }

    #[tokio::test]
    async fn test_replies_are_remembered() {
        let (router, _) = router_with(None);
        router.handle_message(9, "phở 50k").await.unwrap();

        let history = router.memory.formatted_history(9).await;
        assert!(history.contains("User: phở 50k"));
        assert!(history.contains("Đã ghi: phở"));
    }

    #[test]
    fn test_over_budget_reply_raises_alarm() {
        let snapshot = WeeklyBudgetSnapshot {
            week_start: NaiveDate::from_ymd_opt(2025, 8, 18)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            week_end: NaiveDate::from_ymd_opt(2025, 8, 24)
                .unwrap()
                .and_hms_opt(23, 59, 59)
                .unwrap(),
            total_spent: 750_000,
            remaining: -50_000,
            percent_used: 107.1,
        };
        let records = vec![ExpenseRecord {
            item: "lẩu".to_string(),
            amount: 750_000,
            category: Category::Food,
            timestamp: snapshot.week_start,
        }];

        let reply = compose_expense_reply(&records, None, None, Some(&snapshot), Weekday::Wed);
        assert!(reply.contains("BÁO ĐỘNG"));
        assert!(reply.contains("50000đ!"));
        // Early in the week the caution rides along with the alarm.
        assert!(reply.contains("chậm lại"));

        let weekend = compose_expense_reply(&records, None, None, Some(&snapshot), Weekday::Sun);
        assert!(weekend.contains("BÁO ĐỘNG"));
        assert!(!weekend.contains("chậm lại"));
    }

    #[test]
    fn test_early_week_caution_only_through_thursday() {
        let snapshot = WeeklyBudgetSnapshot {
            week_start: NaiveDate::from_ymd_opt(2025, 8, 18)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            week_end: NaiveDate::from_ymd_opt(2025, 8, 24)
                .unwrap()
                .and_hms_opt(23, 59, 59)
                .unwrap(),
            total_spent: 600_000,
            remaining: 100_000,
            percent_used: 85.7,
        };
        let records = vec![ExpenseRecord {
            item: "cơm".to_string(),
            amount: 35_000,
            category: Category::Food,
            timestamp: snapshot.week_start,
        }];

        let tuesday = compose_expense_reply(&records, None, None, Some(&snapshot), Weekday::Tue);
        assert!(tuesday.contains("chậm lại"));

        let saturday = compose_expense_reply(&records, None, None, Some(&snapshot), Weekday::Sat);
        assert!(!saturday.contains("chậm lại"));
    }
}
