//! Daily reminder registry
//!
//! Reminders survive restarts via a small JSON file keyed by user id.
//! Each armed reminder runs as its own tokio task that sleeps until the
//! next local occurrence of its wall-clock time, delivers, then sleeps
//! another 24 hours. Entries saved without a chat target cannot be
//! delivered and are dropped at restore time with a warning.

use crate::error::{AgentError, Result};
use chrono::{Duration as ChronoDuration, Local, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub hour: u32,
    pub minute: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_target: Option<i64>,
}

/// Delivery seam. The production impl sends a chat message; tests
/// record calls.
#[async_trait::async_trait]
pub trait ReminderSink: Send + Sync {
    async fn deliver(&self, chat_target: i64, message: &str) -> Result<()>;
}

pub struct ReminderRegistry {
    path: PathBuf,
    reminders: Arc<RwLock<HashMap<String, Reminder>>>,
    handles: RwLock<HashMap<String, JoinHandle<()>>>,
}

impl ReminderRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reminders: Arc::new(RwLock::new(HashMap::new())),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Load the JSON file and arm every valid entry. Entries without a
    /// chat target are dropped, not restored.
    pub async fn restore(&self, sink: Arc<dyn ReminderSink>) -> Result<usize> {
        let stored = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => serde_json::from_str::<HashMap<String, Reminder>>(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        let mut restored = 0;
        for (user_id, reminder) in stored {
            if reminder.chat_target.is_none() {
                warn!(%user_id, "stored reminder has no chat target, dropping");
                continue;
            }
            self.arm(&user_id, reminder.clone(), Arc::clone(&sink)).await;
            self.reminders.write().await.insert(user_id, reminder);
            restored += 1;
        }

        if restored > 0 {
            self.save().await?;
            info!(count = restored, "reminders restored from disk");
        }
        Ok(restored)
    }

    /// Set or replace a user's daily reminder and persist the registry.
    pub async fn set(
        &self,
        user_id: &str,
        hour: u32,
        minute: u32,
        chat_target: i64,
        sink: Arc<dyn ReminderSink>,
    ) -> Result<()> {
        if hour > 23 || minute > 59 {
            return Err(AgentError::Validation(format!(
                "giờ nhắc không hợp lệ: {hour:02}:{minute:02}"
            )));
        }

        let reminder = Reminder {
            hour,
            minute,
            chat_target: Some(chat_target),
        };

        self.arm(user_id, reminder.clone(), sink).await;
        self.reminders
            .write()
            .await
            .insert(user_id.to_string(), reminder);
        self.save().await?;

        info!(user_id, hour, minute, "daily reminder set");
        Ok(())
    }

    /// Remove a user's reminder, cancelling its timer task. Returns
    /// whether one existed.
    pub async fn remove(&self, user_id: &str) -> Result<bool> {
        if let Some(handle) = self.handles.write().await.remove(user_id) {
            handle.abort();
        }
        let removed = self.reminders.write().await.remove(user_id).is_some();
        if removed {
            self.save().await?;
            info!(user_id, "daily reminder removed");
        }
        Ok(removed)
    }

    pub async fn get(&self, user_id: &str) -> Option<Reminder> {
        self.reminders.read().await.get(user_id).cloned()
    }

    async fn save(&self) -> Result<()> {
        let reminders = self.reminders.read().await;
        let json = serde_json::to_string_pretty(&*reminders)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Replace any existing timer task for this user with a fresh one.
    async fn arm(&self, user_id: &str, reminder: Reminder, sink: Arc<dyn ReminderSink>) {
        let Some(chat_target) = reminder.chat_target else {
            return;
        };

        let mut handles = self.handles.write().await;
        if let Some(old) = handles.remove(user_id) {
            old.abort();
        }

        let owner = user_id.to_string();
        let handle = tokio::spawn(async move {
            loop {
                let wait = duration_until(reminder.hour, reminder.minute);
                tokio::time::sleep(wait).await;

                let message = "⏰ Đến giờ ghi chi tiêu rồi! Hôm nay bạn đã tiêu những gì?";
                if let Err(e) = sink.deliver(chat_target, message).await {
                    error!(user_id = %owner, error = %e, "reminder delivery failed");
                }
            }
        });
        handles.insert(user_id.to_string(), handle);
    }
}

/// Time until the next local occurrence of `hh:mm`. If that time has
/// already passed today, the next occurrence is tomorrow.
fn duration_until(hour: u32, minute: u32) -> std::time::Duration {
    let now = Local::now().naive_local();
    let target_time = NaiveTime::from_hms_opt(hour, minute, 0)
        .unwrap_or_else(|| NaiveTime::from_hms_opt(0, 0, 0).expect("midnight is always valid"));

    let mut target = now.date().and_time(target_time);
    if target <= now {
        target += ChronoDuration::days(1);
    }

    (target - now)
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(60))
}
