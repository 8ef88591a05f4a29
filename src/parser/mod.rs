pub mod dispatch;
pub mod explodes;
pub mod yaml;
