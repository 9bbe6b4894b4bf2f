pub mod interactions;
