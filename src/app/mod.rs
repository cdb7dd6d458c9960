pub mod command;

pub use command::{execute, Command, EditInput, PublishInput};
