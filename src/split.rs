//! Bill splitter
//!
//! Splits a total among a head-count or a named list. Integer division
//! with the remainder assigned to the last person so the shares always
//! sum back to the total.

use crate::error::{AgentError, Result};
use crate::parser::amount;

#[derive(Debug, Clone, PartialEq)]
pub struct BillShare {
    pub name: String,
    pub amount: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BillSplit {
    pub total: i64,
    pub shares: Vec<BillShare>,
}

/// Parse arguments like `"500k 4"` or `"300k Nam, Hùng, Lộc"` and
/// compute the split.
pub fn split_bill(args: &str) -> Result<BillSplit> {
    let args = args.trim();
    if args.is_empty() {
        return Err(AgentError::Validation(
            "cần tổng tiền và số người hoặc danh sách tên".to_string(),
        ));
    }

    let total = amount::first_match(args).ok_or_else(|| {
        AgentError::Validation("không tìm thấy tổng tiền trong yêu cầu chia".to_string())
    })?;
    if total <= 0 {
        return Err(AgentError::Validation("tổng tiền phải lớn hơn 0".to_string()));
    }

    // Everything after the first token is either a head-count or names.
    let rest = match args.split_whitespace().next() {
        Some(first) => args[first.len()..].trim(),
        None => "",
    };

    let names: Vec<String> = if let Ok(count) = rest.parse::<usize>() {
        if count == 0 {
            return Err(AgentError::Validation("số người phải lớn hơn 0".to_string()));
        }
        (1..=count).map(|i| format!("Người {i}")).collect()
    } else {
        let listed: Vec<String> = rest
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
        if listed.is_empty() {
            return Err(AgentError::Validation(
                "cần số người hoặc danh sách tên sau tổng tiền".to_string(),
            ));
        }
        listed
    };

    let count = names.len() as i64;
    let base = total / count;
    let remainder = total % count;

    let shares = names
        .iter()
        .enumerate()
        .map(|(i, name)| BillShare {
            name: name.clone(),
            amount: if i as i64 == count - 1 {
                base + remainder
            } else {
                base
            },
        })
        .collect();

    Ok(BillSplit { total, shares })
}

/// Render a split the way the chat reply shows it.
pub fn format_split(split: &BillSplit) -> String {
    let mut lines = vec![format!(
        "💸 Chia {}đ cho {} người:",
        split.total,
        split.shares.len()
    )];
    for share in &split.shares {
        lines.push(format!("  - {}: {}đ", share.name, share.amount));
    }
    lines.join("\n")
}
