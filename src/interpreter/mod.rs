//! Model-based interpreter (Tier 1)
//!
//! Sends the user's message to the model with a strict JSON output
//! contract, then validates the response into an [`IntentResult`]. The
//! validator is deliberately unforgiving: any response that cannot be
//! proven well-formed is an error, and the caller falls back to the
//! rule-based parser rather than guessing.

use crate::error::{AgentError, Result};
use crate::llm::LlmClient;
use crate::models::{Category, ExpenseDraft, IntentResult};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ModelInterpreter {
    client: Arc<dyn LlmClient>,
}

impl ModelInterpreter {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Classify and extract in one model call. The financial context and
    /// recent history are injected so the model can answer questions
    /// about real figures.
    pub async fn interpret(
        &self,
        message: &str,
        financial_context: &str,
        history: &str,
    ) -> Result<IntentResult> {
        let system_prompt = build_system_prompt(financial_context, history);
        let raw = self.client.complete(&system_prompt, message).await?;
        parse_intent_response(&raw)
    }
}

fn build_system_prompt(financial_context: &str, history: &str) -> String {
    format!(
        "Bạn là trợ lý tài chính cá nhân nói tiếng Việt. Phân tích tin nhắn của \
         người dùng và trả về DUY NHẤT một object JSON, không kèm văn bản nào khác.\n\
         \n\
         Các dạng trả về hợp lệ (trường \"type\" bắt buộc):\n\
         1. Ghi chi tiêu:\n\
            {{\"type\": \"expense\", \"items\": [{{\"item\": \"phở\", \"amount\": 50000, \
         \"category\": \"Ăn uống\", \"date\": \"20/08/2025\"}}], \"note\": null}}\n\
            - \"amount\" là số nguyên dương, đơn vị đồng (50k nghĩa là 50000).\n\
            - \"category\" thuộc: Ăn uống, Di chuyển, Học tập, Khác.\n\
            - \"date\" dạng d/m/Y chỉ khi người dùng nói rõ ngày trong quá khứ, \
         ngược lại để null.\n\
            - \"note\" là nhận xét ngắn kèm theo, hoặc null.\n\
         2. Tra cứu thông tin:\n\
            {{\"type\": \"search\", \"query\": \"giá xăng hôm nay\"}}\n\
         3. Yêu cầu chuyển khoản (người dùng muốn mã QR nhận tiền):\n\
            {{\"type\": \"payment_request\", \"amount\": 150000, \"memo\": \"tien an trua\"}}\n\
         4. Trò chuyện thông thường:\n\
            {{\"type\": \"conversation\", \"reply\": \"câu trả lời của bạn\"}}\n\
         \n\
         Khi trả lời câu hỏi về chi tiêu, dùng số liệu thật dưới đây, không bịa.\n\
         \n\
         {financial_context}\n\
         \n\
         Lịch sử hội thoại gần đây:\n{history}"
    )
}

/// Strip a Markdown code fence if the model wrapped its JSON in one.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

/// Validate raw model output into an [`IntentResult`]. Every path
/// either proves the field well-formed or rejects the response.
pub fn parse_intent_response(raw: &str) -> Result<IntentResult> {
    let cleaned = strip_code_fences(raw);
    let value: Value = serde_json::from_str(cleaned)
        .map_err(|e| AgentError::Validation(format!("model output is not JSON: {e}")))?;

    let obj = value
        .as_object()
        .ok_or_else(|| AgentError::Validation("model output is not a JSON object".to_string()))?;

    let intent_type = obj
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| AgentError::Validation("missing \"type\" tag".to_string()))?;

    match intent_type {
        "expense" => parse_expense(obj),
        "search" => {
            let query = obj
                .get("query")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .ok_or_else(|| AgentError::Validation("search intent without query".to_string()))?;
            Ok(IntentResult::Search {
                query: query.to_string(),
            })
        }
        "payment_request" => {
            let amount = obj
                .get("amount")
                .and_then(Value::as_i64)
                .filter(|a| *a > 0)
                .ok_or_else(|| {
                    AgentError::Validation("payment_request needs a positive integer amount".to_string())
                })?;
            let memo = obj
                .get("memo")
                .and_then(Value::as_str)
                .unwrap_or("thanh toan")
                .trim()
                .to_string();
            Ok(IntentResult::PaymentRequest { amount, memo })
        }
        "conversation" => {
            let reply = obj
                .get("reply")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| {
                    AgentError::Validation("conversation intent without reply".to_string())
                })?;
            Ok(IntentResult::Conversation {
                reply: reply.to_string(),
            })
        }
        other => Err(AgentError::Validation(format!(
            "unknown intent type \"{other}\""
        ))),
    }
}

fn parse_expense(obj: &serde_json::Map<String, Value>) -> Result<IntentResult> {
    let raw_items = obj
        .get("items")
        .and_then(Value::as_array)
        .ok_or_else(|| AgentError::Validation("expense intent without items array".to_string()))?;

    let mut items = Vec::new();
    for raw in raw_items {
        match validate_item(raw) {
            Some(draft) => items.push(draft),
            None => {
                warn!(item = %raw, "dropping malformed expense item from model output");
            }
        }
    }

    if items.is_empty() {
        return Err(AgentError::Validation(
            "expense intent with no valid items".to_string(),
        ));
    }

    debug!(item_count = items.len(), "model expense intent validated");

    let note = obj
        .get("note")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);

    Ok(IntentResult::Expense { items, note })
}

/// One expense item. Item name must be non-empty, amount a positive
/// integer. Category falls back to Khác and a bad date is treated as
/// absent; those two fields degrade instead of rejecting the item.
fn validate_item(raw: &Value) -> Option<ExpenseDraft> {
    let obj = raw.as_object()?;

    let item = obj
        .get("item")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())?
        .to_string();

    let amount = obj.get("amount").and_then(Value::as_i64).filter(|a| *a > 0)?;

    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .and_then(Category::from_label)
        .unwrap_or(Category::Other);

    let date = obj
        .get("date")
        .and_then(Value::as_str)
        .and_then(|s| NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok());

    Some(ExpenseDraft {
        item,
        amount,
        category,
        date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expense_response_parsed() {
        let raw = r#"{"type": "expense", "items": [
            {"item": "phở", "amount": 50000, "category": "Ăn uống", "date": null}
        ], "note": "bữa sáng"}"#;

        let result = parse_intent_response(raw).unwrap();
        match result {
            IntentResult::Expense { items, note } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].item, "phở");
                assert_eq!(items[0].amount, 50_000);
                assert_eq!(items[0].category, Category::Food);
                assert!(items[0].date.is_none());
                assert_eq!(note.as_deref(), Some("bữa sáng"));
            }
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[test]
    fn test_code_fences_stripped() {
        let raw = "```json\n{\"type\": \"conversation\", \"reply\": \"chào bạn\"}\n```";
        let result = parse_intent_response(raw).unwrap();
        assert!(matches!(result, IntentResult::Conversation { .. }));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = parse_intent_response("xin chào, tôi không phải JSON").unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
        assert!(err.triggers_fallback());
    }

    #[test]
    fn test_unknown_type_tag_rejected() {
        let err = parse_intent_response(r#"{"type": "weather", "city": "Hà Nội"}"#).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn test_bad_items_dropped_good_kept() {
        let raw = r#"{"type": "expense", "items": [
            {"item": "phở", "amount": 50000, "category": "Ăn uống"},
            {"item": "", "amount": 20000},
            {"item": "xăng", "amount": -5},
            {"item": "trà đá", "amount": "năm nghìn"}
        ]}"#;

        let result = parse_intent_response(raw).unwrap();
        match result {
            IntentResult::Expense { items, .. } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].item, "phở");
            }
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[test]
    fn test_all_items_invalid_is_hard_failure() {
        let raw = r#"{"type": "expense", "items": [{"item": "", "amount": 0}]}"#;
        let err = parse_intent_response(raw).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn test_unknown_category_coerced_to_other() {
        let raw = r#"{"type": "expense", "items": [
            {"item": "vé số", "amount": 10000, "category": "Giải trí"}
        ]}"#;
        match parse_intent_response(raw).unwrap() {
            IntentResult::Expense { items, .. } => {
                assert_eq!(items[0].category, Category::Other);
            }
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_date_treated_as_absent() {
        let raw = r#"{"type": "expense", "items": [
            {"item": "phở", "amount": 50000, "date": "30/02/2025"}
        ]}"#;
        match parse_intent_response(raw).unwrap() {
            IntentResult::Expense { items, .. } => assert!(items[0].date.is_none()),
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[test]
    fn test_backdated_expense_keeps_date() {
        let raw = r#"{"type": "expense", "items": [
            {"item": "cơm", "amount": 35000, "date": "18/08/2025"}
        ]}"#;
        match parse_intent_response(raw).unwrap() {
            IntentResult::Expense { items, .. } => {
                assert_eq!(
                    items[0].date,
                    NaiveDate::from_ymd_opt(2025, 8, 18)
                );
            }
            other => panic!("expected expense, got {other:?}"),
        }
    }

    #[test]
    fn test_payment_request_needs_positive_amount() {
        let ok = parse_intent_response(
            r#"{"type": "payment_request", "amount": 150000, "memo": "tien an trua"}"#,
        )
        .unwrap();
        match ok {
            IntentResult::PaymentRequest { amount, memo } => {
                assert_eq!(amount, 150_000);
                assert_eq!(memo, "tien an trua");
            }
            other => panic!("expected payment request, got {other:?}"),
        }

        let err =
            parse_intent_response(r#"{"type": "payment_request", "amount": 0}"#).unwrap_err();
        assert!(matches!(err, AgentError::Validation(_)));
    }

    #[test]
    fn test_search_intent() {
        let result =
            parse_intent_response(r#"{"type": "search", "query": "giá xăng hôm nay"}"#).unwrap();
        match result {
            IntentResult::Search { query } => assert_eq!(query, "giá xăng hôm nay"),
            other => panic!("expected search, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_interpret_uses_client_output() {
        struct Canned;

        #[async_trait::async_trait]
        impl LlmClient for Canned {
            async fn complete(&self, _system: &str, _user: &str) -> crate::Result<String> {
                Ok(r#"{"type": "conversation", "reply": "chào bạn"}"#.to_string())
            }
        }

        let interpreter = ModelInterpreter::new(Arc::new(Canned));
        let result = interpreter.interpret("chào", "ctx", "").await.unwrap();
        match result {
            IntentResult::Conversation { reply } => assert_eq!(reply, "chào bạn"),
            other => panic!("expected conversation, got {other:?}"),
        }
    }
}
