pub mod cart;
pub mod item;
pub mod order;
pub mod user;
