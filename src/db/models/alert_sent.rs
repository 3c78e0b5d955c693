use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kinds of alert email the notifier sends at most once per user and info request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertType {
    /// Tell the user that their info request has become overdue
    #[serde(rename = "overdue_1")]
    Overdue1,
    /// Remind the user to classify the recent response
    #[serde(rename = "new_response_reminder_1")]
    NewResponseReminder1,
}

impl AlertType {
    pub const ALL: [AlertType; 2] = [AlertType::Overdue1, AlertType::NewResponseReminder1];

    /// Parse the stored representation. Exact match only.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "overdue_1" => Some(AlertType::Overdue1),
            "new_response_reminder_1" => Some(AlertType::NewResponseReminder1),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlertType::Overdue1 => "overdue_1",
            AlertType::NewResponseReminder1 => "new_response_reminder_1",
        }
    }
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<AlertType> for String {
    fn from(alert_type: AlertType) -> Self {
        alert_type.as_str().to_string()
    }
}

impl TryFrom<String> for AlertType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("Invalid alert type: {}", value))
    }
}

impl TryFrom<&str> for AlertType {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value).ok_or_else(|| format!("Invalid alert type: {}", value))
    }
}

/// A row of `user_info_request_sent_alerts`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AlertSent {
    pub id: i64,
    pub user_id: i64,
    pub info_request_id: i64,
    pub alert_type: String,
    pub created_at: NaiveDateTime,
}

impl AlertSent {
    pub fn kind(&self) -> Option<AlertType> {
        AlertType::from_str(&self.alert_type)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAlertSent {
    pub user_id: i64,
    pub info_request_id: i64,
    pub alert_type: AlertType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_alert_types() {
        for kind in AlertType::ALL {
            assert_eq!(AlertType::from_str(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn rejects_unknown_or_misspelled_types() {
        for raw in ["", "overdue", "overdue_2", "OVERDUE_1", " overdue_1", "very_overdue_1"] {
            assert!(AlertType::try_from(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn serde_uses_stored_names() {
        let json = serde_json::to_string(&AlertType::NewResponseReminder1).unwrap();
        assert_eq!(json, "\"new_response_reminder_1\"");
        let back: AlertType = serde_json::from_str("\"overdue_1\"").unwrap();
        assert_eq!(back, AlertType::Overdue1);
    }
}
