//! Core logic for the Finding Players map: community models, the game
//! catalog, viewport math and pin clustering.

pub mod games;
pub mod geo;
pub mod models;
pub mod pins;
