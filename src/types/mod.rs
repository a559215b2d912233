pub mod time;
pub mod variable;
