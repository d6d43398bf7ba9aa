//! Route handlers for the account flows.
//!
//! Every flow renders a [`page::FormPage`] on `GET` or on invalid input and
//! answers `303 See Other` once the submission succeeded.

pub mod health;
pub mod home;
pub mod login;
pub mod logout;
pub mod page;
pub mod register;

pub use health::health;
pub use home::home;
pub use login::{login, login_form};
pub use logout::logout;
pub use register::{register, register_form};
