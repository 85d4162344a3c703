//! Account services: password hashing port and the register/login/logout flow.

pub mod auth;
pub mod password;
