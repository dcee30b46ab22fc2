pub mod dispatch;
pub mod notify;
