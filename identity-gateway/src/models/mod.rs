pub mod token;
pub mod user;

pub use token::{AdminToken, TokenResult};
pub use user::UserRecord;
