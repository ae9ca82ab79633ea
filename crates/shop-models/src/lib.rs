pub mod cart;
pub mod deposit;
pub mod money;
pub mod order;
pub mod order_transitions;
pub mod product;
pub mod status;

pub use cart::*;
pub use deposit::*;
pub use money::*;
pub use order::*;
pub use order_transitions::*;
pub use product::*;
pub use status::*;
