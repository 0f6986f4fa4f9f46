//! VietQR payment image links
//!
//! Builds an image URL for the VietQR render service; no QR generation
//! happens locally. Account details come from the environment so the
//! repository never carries real banking data.

use reqwest::Url;
use tracing::warn;

const VIETQR_BASE: &str = "https://img.vietqr.io/image";

#[derive(Debug, Clone)]
pub struct QrConfig {
    pub bank_id: String,
    pub account_no: String,
    pub account_name: String,
    pub template: String,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self {
            bank_id: "970422".to_string(),
            account_no: "0000000000".to_string(),
            account_name: "NGUOI NHAN".to_string(),
            template: "compact2".to_string(),
        }
    }
}

impl QrConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bank_id: std::env::var("VIETQR_BANK_ID").unwrap_or(defaults.bank_id),
            account_no: std::env::var("VIETQR_ACCOUNT_NO").unwrap_or(defaults.account_no),
            account_name: std::env::var("VIETQR_ACCOUNT_NAME").unwrap_or(defaults.account_name),
            template: std::env::var("VIETQR_TEMPLATE").unwrap_or(defaults.template),
        }
    }

    /// Image URL for a payment of `amount` VND with the given memo.
    /// Query values are percent-encoded by the URL builder.
    pub fn build_payment_image_url(&self, amount: i64, memo: &str) -> String {
        let base = format!(
            "{VIETQR_BASE}/{}-{}-{}.png",
            self.bank_id, self.account_no, self.template
        );

        match Url::parse(&base) {
            Ok(mut url) => {
                url.query_pairs_mut()
                    .append_pair("amount", &amount.to_string())
                    .append_pair("addInfo", memo)
                    .append_pair("accountName", &self.account_name);
                url.to_string()
            }
            Err(e) => {
                warn!(error = %e, "QR base URL failed to parse, returning unencoded fallback");
                format!("{base}?amount={amount}")
            }
        }
    }
}
