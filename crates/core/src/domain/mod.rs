pub mod attendance;
pub mod category;
pub mod finance;
pub mod invoice;
pub mod leave;
pub mod notification;
pub mod project;
pub mod submission;
pub mod task;
pub mod user;
