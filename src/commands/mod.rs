pub mod browse;
pub mod init;
pub mod tasks;
pub mod users;
