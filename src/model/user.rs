use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use super::{role::Role, team::Team};
use crate::leave::balance::LeaveHolder;

/// Row of the `users` table. Never serialised directly: it carries the
/// password hash. Use [`UserView`] for responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub designation: Option<String>,
    pub probation_completed: bool,
    pub emp_number: Option<String>,
    pub doj: Option<NaiveDate>,
    pub perm_address: Option<String>,
    pub curr_address: Option<String>,
    pub emerg_contact_name: Option<String>,
    pub emerg_contact_num: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub pan: Option<String>,
    pub aadhar: Option<String>,
    pub role: Role,
    /// Back-reference to the supervising user. Reports are resolved with
    /// `WHERE manager_id = ?`, never through an inverse pointer.
    pub manager_id: Option<u64>,
    pub department: Option<String>,
    pub team: Option<Team>,
    pub profile_picture: Option<String>,
    pub last_working_day: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub comment: Option<String>,
}

pub const USER_COLUMNS: &str = r#"
    id, username, password_hash, full_name, designation, probation_completed,
    emp_number, doj, perm_address, curr_address, emerg_contact_name,
    emerg_contact_num, birth_date, pan, aadhar, role, manager_id, department,
    team, profile_picture, last_working_day, salary, comment
"#;

impl LeaveHolder for User {
    fn holder_id(&self) -> u64 {
        self.id
    }

    fn date_of_joining(&self) -> Option<NaiveDate> {
        self.doj
    }

    fn team(&self) -> Option<Team> {
        self.team
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "id": 12,
    "username": "asha",
    "full_name": "Asha Rao",
    "designation": "Analyst",
    "probation_completed": true,
    "emp_number": "EMP-012",
    "doj": "2024-01-01",
    "role": "employee",
    "manager_id": 3,
    "department": "Finance",
    "team": "corporate"
}))]
pub struct UserView {
    pub id: u64,
    pub username: String,
    pub full_name: Option<String>,
    pub designation: Option<String>,
    pub probation_completed: bool,
    pub emp_number: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub doj: Option<NaiveDate>,
    pub perm_address: Option<String>,
    pub curr_address: Option<String>,
    pub emerg_contact_name: Option<String>,
    pub emerg_contact_num: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub birth_date: Option<NaiveDate>,
    pub pan: Option<String>,
    pub aadhar: Option<String>,
    pub role: Role,
    pub manager_id: Option<u64>,
    pub department: Option<String>,
    pub team: Option<Team>,
    pub profile_picture: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub last_working_day: Option<NaiveDate>,
    pub salary: Option<f64>,
    pub comment: Option<String>,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            full_name: u.full_name,
            designation: u.designation,
            probation_completed: u.probation_completed,
            emp_number: u.emp_number,
            doj: u.doj,
            perm_address: u.perm_address,
            curr_address: u.curr_address,
            emerg_contact_name: u.emerg_contact_name,
            emerg_contact_num: u.emerg_contact_num,
            birth_date: u.birth_date,
            pan: u.pan,
            aadhar: u.aadhar,
            role: u.role,
            manager_id: u.manager_id,
            department: u.department,
            team: u.team,
            profile_picture: u.profile_picture,
            last_working_day: u.last_working_day,
            salary: u.salary,
            comment: u.comment,
        }
    }
}
