pub mod measurement;
pub mod notification;
pub mod plant;
pub mod reminder;
pub mod status;
