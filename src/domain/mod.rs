pub mod article;
pub mod session;
