pub mod import;
pub mod init;
pub mod login;
pub mod status;
pub mod unfollow;
