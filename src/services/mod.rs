pub mod auth;
pub mod email;
pub mod passcodes;
pub mod tokens;
pub mod users;
