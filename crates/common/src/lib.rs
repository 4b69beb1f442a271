pub mod types;

pub use types::{BookId, CartLineId, OrderId, UserId};
