pub mod controller;
pub mod index;
pub mod model;
pub mod service;
pub mod session;
pub mod store;
pub mod thread;

#[cfg(test)]
pub mod testing;
