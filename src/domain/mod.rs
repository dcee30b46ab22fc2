pub mod message;
pub mod notification;
pub mod settings;
pub mod ticket;
pub mod user;
