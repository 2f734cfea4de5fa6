//! Block-allocated value pools with stable slot handles.

mod block;
#[allow(clippy::module_inception)]
mod pool;

pub use pool::{Pool, SlotHandle};
