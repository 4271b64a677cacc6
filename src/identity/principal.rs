use serde::{Deserialize, Serialize};

/// The authenticated principal as returned by `/auth/me` and `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    pub role: String,
    /// Linkage to the employee record for `employee` accounts.
    #[serde(default)]
    pub employee_id: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool { true }

impl Identity {
    /// Name shown in the shell header: full name, then username, then email.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.email)
    }

    /// Same principal with the same capabilities. Profile fields may differ.
    pub fn same_principal(&self, other: &Identity) -> bool {
        self.id == other.id && self.role == other.role
    }
}
