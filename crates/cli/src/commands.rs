pub mod cleanup;
pub mod comments;
pub mod kv;
pub mod login;
pub mod logs;
pub mod process;
pub mod stats;
