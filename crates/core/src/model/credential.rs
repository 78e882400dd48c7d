use serde::{Deserialize, Serialize};

/// Student profile attached to a login response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentProfile {
    pub name: Option<String>,
    pub roll_number: Option<String>,
}

/// Bearer credential for the signed-in student, stored as returned by login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCredential {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<StudentProfile>,
}

impl StudentCredential {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }

    /// A credential with a blank token is treated as absent.
    #[must_use]
    pub fn is_usable(&self) -> bool {
        !self.token.trim().is_empty()
    }

    /// `Welcome, <name> (<roll>)` when the profile is known.
    #[must_use]
    pub fn greeting(&self) -> Option<String> {
        let user = self.user.as_ref()?;
        let name = user.name.as_deref()?;
        Some(match user.roll_number.as_deref() {
            Some(roll) => format!("Welcome, {name} ({roll})"),
            None => format!("Welcome, {name}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_payload_round_trips() {
        let raw = r#"{"token":"abc","user":{"name":"Asha","rollNumber":"CCC-17"}}"#;
        let cred: StudentCredential = serde_json::from_str(raw).unwrap();
        assert!(cred.is_usable());
        assert_eq!(cred.greeting().as_deref(), Some("Welcome, Asha (CCC-17)"));
        let back: StudentCredential =
            serde_json::from_str(&serde_json::to_string(&cred).unwrap()).unwrap();
        assert_eq!(back, cred);
    }

    #[test]
    fn blank_token_is_unusable() {
        assert!(!StudentCredential::new("  ").is_usable());
        assert_eq!(StudentCredential::new("t").greeting(), None);
    }
}
