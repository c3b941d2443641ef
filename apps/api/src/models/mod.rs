pub mod cv;
pub mod template;
pub mod user;
