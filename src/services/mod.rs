// Livemark services
// Services talk to the outside: mutation submission against the backend and
// settings persistence on disk.

pub mod mutation_service;
pub mod settings_engine;
