pub mod cli;
pub mod command;
pub mod complete;
pub mod editor;
pub mod error;
pub mod fetch;
pub mod output;
pub mod path;
pub mod repl;
pub mod sitemap;
pub mod system;
pub mod vfs;
