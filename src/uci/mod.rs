pub mod parser;
#[path = "loop.rs"]
pub mod uci_loop;

pub use parser::{parse, UciCommand};
pub use uci_loop::{run_uci_loop, UciEngine};
