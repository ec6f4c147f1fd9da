pub mod check;
pub mod init;
pub mod keys;
pub mod run;
