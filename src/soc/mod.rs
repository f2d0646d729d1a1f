//! Device Models and Bench Assembly.
//!
//! This module contains the following components:
//! 1. **Traits**: The `Peripheral` interface implemented by clocked models.
//! 2. **Poly**: A polynomial evaluator with a register port and two streams.
//! 3. **Builder**: The `System` bench assembled from a configuration.

/// Bench assembly from configuration.
pub mod builder;

/// Polynomial evaluator device model.
pub mod poly;

/// Clocked peripheral interface.
pub mod traits;

pub use builder::System;
pub use poly::PolyEval;
pub use traits::Peripheral;
