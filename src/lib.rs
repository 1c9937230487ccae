pub mod app;
pub mod auth;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod editor;
pub mod io;
pub mod logger;
pub mod ops;
pub mod settings;
pub mod state;
pub mod theme;
