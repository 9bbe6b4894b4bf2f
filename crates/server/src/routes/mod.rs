pub mod health;
pub mod question;
