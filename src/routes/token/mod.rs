mod handler;
mod model;

pub use handler::{hello, login};
pub use model::LoginResponse;
