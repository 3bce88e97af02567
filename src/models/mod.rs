pub mod backup;
pub mod dashboard;
pub mod matrix;
pub mod permission;
pub mod role;
pub mod setting;
pub mod table;
pub mod user;
