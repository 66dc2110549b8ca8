pub mod issue;
pub mod log;
