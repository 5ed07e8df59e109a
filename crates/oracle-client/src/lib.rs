pub mod gateway;
pub mod mocks;

pub use gateway::{RequestGateway, RequestOptions};
