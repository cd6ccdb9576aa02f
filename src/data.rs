mod simtime;
mod value;

pub use simtime::*;
pub use value::*;
