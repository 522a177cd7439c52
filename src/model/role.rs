use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Employee,
    Supervisor,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_role_names() {
        assert_eq!("supervisor".parse::<Role>().unwrap(), Role::Supervisor);
        assert_eq!(Role::Admin.as_ref(), "admin");
        assert!("hr".parse::<Role>().is_err());
    }
}
