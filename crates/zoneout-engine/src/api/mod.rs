pub mod collaborators;
pub mod game;
pub mod types;
