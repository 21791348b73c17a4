use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "admin_access_level", rename_all = "lowercase")]
pub enum AccessLevel {
    Full,
    Partial,
    Limited,
}

impl AccessLevel {
    fn rank(&self) -> u8 {
        match self {
            AccessLevel::Full => 3,
            AccessLevel::Partial => 2,
            AccessLevel::Limited => 1,
        }
    }

    pub fn outranks(&self, other: AccessLevel) -> bool {
        self.rank() > other.rank()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminRecord {
    pub external_identity_id: String,
    pub access_level: AccessLevel,
    pub created_by: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}
