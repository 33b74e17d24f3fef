pub mod app;
pub mod draw;
pub mod theme;
pub mod workspace;
