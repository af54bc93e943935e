pub mod context;
pub mod doctor;
pub mod init;
pub mod list;
pub mod serve;
