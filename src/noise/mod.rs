//! Noise generation module for terrain synthesis.
//!
//! Lattice gradient noise with a seeded permutation table, plus multi-octave
//! fractal Brownian motion built on top of it.

mod perlin;

pub use perlin::PerlinNoise;
