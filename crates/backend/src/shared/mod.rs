pub mod config;
pub mod cpf;
pub mod data;
