mod calculator;
mod receipt;

pub use calculator::settle;
pub use receipt::build_line;
