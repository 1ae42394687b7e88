pub mod export;
pub mod import;
pub mod network;
pub mod resource;
