mod ringbuf;
mod sink;

pub use ringbuf::*;
pub use sink::*;
