//! API module - gateway routes

pub mod routes;
