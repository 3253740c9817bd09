pub mod check;
pub mod grade;
pub mod init;
pub mod recheck;
pub mod validate;
