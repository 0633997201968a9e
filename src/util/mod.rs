pub mod src;
pub mod stack;

pub use self::{
    src::{SrcLoc, SrcRegion},
    stack::with_stack,
};
