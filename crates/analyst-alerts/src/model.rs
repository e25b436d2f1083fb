//! Users and alert definitions

use crate::error::{AlertError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Daily fire point of an alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    Morning,
    Evening,
}

impl Trigger {
    pub const ALL: [Self; 2] = [Self::Morning, Self::Evening];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Evening => "evening",
        }
    }

    /// Human label used in email subjects and bodies
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "Morning Pre-Market",
            Self::Evening => "Evening Post-Market",
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = AlertError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "evening" => Ok(Self::Evening),
            other => Err(AlertError::InvalidInput(format!(
                "trigger_time must be 'morning' or 'evening', got '{other}'"
            ))),
        }
    }
}

/// Registered alert recipient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Request to register a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl NewUser {
    /// Validate and stamp a new user record, returning it with its password hash
    pub fn into_user(self) -> Result<(User, String)> {
        let email = self.email.trim().to_string();
        let name = self.name.trim().to_string();
        if !email.contains('@') {
            return Err(AlertError::InvalidInput(format!("invalid email address: {email}")));
        }
        if name.is_empty() {
            return Err(AlertError::InvalidInput("name must not be empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(AlertError::InvalidInput("password must not be empty".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email,
            name,
            created_at: Utc::now(),
        };
        Ok((user, hash_password(&self.password)))
    }
}

/// Email and password presented at login
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Lowercase hex SHA-256 of `password`
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Scheduled alert owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDefinition {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub trigger_time: Trigger,
    pub symbols: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Request to create an alert
#[derive(Debug, Clone, Deserialize)]
pub struct NewAlert {
    pub user_id: String,
    pub prompt: String,
    pub trigger_time: Trigger,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewAlert {
    /// Validate and stamp a new alert definition
    pub fn into_definition(self) -> Result<AlertDefinition> {
        let prompt = validate_prompt(&self.prompt)?;
        Ok(AlertDefinition {
            id: Uuid::new_v4().to_string(),
            user_id: self.user_id,
            prompt,
            trigger_time: self.trigger_time,
            symbols: normalize_symbols(self.symbols),
            is_active: self.is_active,
            created_at: Utc::now(),
        })
    }
}

/// Partial update of an alert; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertUpdate {
    pub prompt: Option<String>,
    pub trigger_time: Option<Trigger>,
    pub symbols: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

impl AlertUpdate {
    /// Merge the present fields into `alert`
    pub fn apply(self, alert: &mut AlertDefinition) -> Result<()> {
        if let Some(prompt) = self.prompt {
            alert.prompt = validate_prompt(&prompt)?;
        }
        if let Some(trigger) = self.trigger_time {
            alert.trigger_time = trigger;
        }
        if let Some(symbols) = self.symbols {
            alert.symbols = normalize_symbols(symbols);
        }
        if let Some(active) = self.is_active {
            alert.is_active = active;
        }
        Ok(())
    }
}

fn validate_prompt(prompt: &str) -> Result<String> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AlertError::InvalidInput("prompt must not be empty".to_string()));
    }
    Ok(prompt.to_string())
}

/// Uppercase, trim, drop blanks and duplicates while keeping order
fn normalize_symbols(symbols: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() && !out.contains(&symbol) {
            out.push(symbol);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_trigger_serde_and_parse() {
        assert_eq!(serde_json::to_value(Trigger::Morning).unwrap(), json!("morning"));
        assert_eq!("Evening".parse::<Trigger>().unwrap(), Trigger::Evening);
        assert!("noon".parse::<Trigger>().is_err());
        assert_eq!(Trigger::Evening.label(), "Evening Post-Market");
    }

    #[test]
    fn test_new_alert_defaults_and_normalization() {
        let request: NewAlert = serde_json::from_value(json!({
            "user_id": "u1",
            "prompt": "  Watch my tech names ",
            "trigger_time": "morning",
            "symbols": ["aapl", " msft", "AAPL", ""]
        }))
        .unwrap();

        let alert = request.into_definition().unwrap();
        assert!(alert.is_active);
        assert_eq!(alert.prompt, "Watch my tech names");
        assert_eq!(alert.symbols, vec!["AAPL", "MSFT"]);
        assert!(!alert.id.is_empty());
    }

    fn registration(email: &str, password: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: "Ann".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_new_user_validation() {
        let bad = registration("not-an-email", "secret");
        assert!(matches!(bad.into_user(), Err(AlertError::InvalidInput(_))));

        let no_password = registration("ann@example.com", "");
        assert!(matches!(no_password.into_user(), Err(AlertError::InvalidInput(_))));

        let (user, hash) = registration(" ann@example.com ", "password").into_user().unwrap();
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(hash, hash_password("password"));
    }

    #[test]
    fn test_password_hash_is_sha256_hex() {
        assert_eq!(
            hash_password("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
        assert_ne!(hash_password("password"), hash_password("Password"));
    }

    #[test]
    fn test_update_merges_present_fields() {
        let mut alert = NewAlert {
            user_id: "u1".to_string(),
            prompt: "Daily check".to_string(),
            trigger_time: Trigger::Morning,
            symbols: vec![],
            is_active: true,
        }
        .into_definition()
        .unwrap();

        let update: AlertUpdate =
            serde_json::from_value(json!({"is_active": false, "symbols": ["nvda"]})).unwrap();
        update.apply(&mut alert).unwrap();

        assert!(!alert.is_active);
        assert_eq!(alert.symbols, vec!["NVDA"]);
        assert_eq!(alert.prompt, "Daily check");
        assert_eq!(alert.trigger_time, Trigger::Morning);

        let blank = AlertUpdate {
            prompt: Some("   ".to_string()),
            ..AlertUpdate::default()
        };
        assert!(blank.apply(&mut alert).is_err());
    }
}
