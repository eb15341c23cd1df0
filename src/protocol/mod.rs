pub mod command;

pub use command::{CommandEncoder, CommandRequest};
