pub mod attendance;
pub mod audit_log;
pub mod document;
pub mod holiday;
pub mod leave_request;
pub mod role;
pub mod salary_slip;
pub mod task;
pub mod team;
pub mod user;

/// Lets a strum-backed enum be read straight out of a VARCHAR or ENUM column.
/// Binding goes the other way through `as_ref()`.
macro_rules! string_column {
    ($($ty:ty),+ $(,)?) => {$(
        impl sqlx::Type<sqlx::MySql> for $ty {
            fn type_info() -> sqlx::mysql::MySqlTypeInfo {
                <str as sqlx::Type<sqlx::MySql>>::type_info()
            }

            fn compatible(ty: &sqlx::mysql::MySqlTypeInfo) -> bool {
                <str as sqlx::Type<sqlx::MySql>>::compatible(ty)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::MySql> for $ty {
            fn decode(
                value: sqlx::mysql::MySqlValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&'r str as sqlx::Decode<'r, sqlx::MySql>>::decode(value)?;
                Ok(raw.parse()?)
            }
        }
    )+};
}

string_column!(
    role::Role,
    team::Team,
    leave_request::LeaveType,
    leave_request::LeaveStatus,
    task::TaskStatus,
);
