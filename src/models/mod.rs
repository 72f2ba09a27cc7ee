pub mod movie;
pub mod user;

pub use movie::{Movie, MovieInput};
pub use user::User;
