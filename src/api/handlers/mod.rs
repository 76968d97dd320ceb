// HTTP handlers, generic over the backing store

pub mod health;
pub mod members;
pub mod teams;
