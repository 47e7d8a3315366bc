pub mod bid;
pub mod draft;
pub mod item;
pub mod request;
pub mod stop;
