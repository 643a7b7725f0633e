//! Sector and portal 2.5D engine.
//!
//! * [`world`] – map model, geometric predicates and the portal-graph walk
//! * [`sim`] – actors, move-and-slide collision and the fixed-rate tic loop
//! * [`renderer`] – portal renderer emitting column and span draw calls
//! * [`pack`] – binary asset pack reader, writer and map loader

pub mod pack;
pub mod renderer;
pub mod sim;
pub mod world;
