//! Startup helpers shared by the Dockline service binaries

pub mod bootstrap;
