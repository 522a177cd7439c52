pub mod balance;
pub mod history;
pub mod policy;
