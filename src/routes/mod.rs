pub mod donations;
pub mod users;
