// chainops - maintenance tooling for a validator/fullnode network
// Core library functionality

pub mod cli;
pub mod models;
pub mod services;
pub mod utils;
