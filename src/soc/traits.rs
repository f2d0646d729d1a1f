//! Peripheral Model Traits.
//!
//! Defines the interface that clocked hardware models implement so the
//! kernel can evaluate them on every rising edge alongside the bus engines.

/// A clocked model of a piece of the simulated design.
///
/// Models own the lines they drive. On each rising edge they read the values
/// sampled at the previous settle point (their own outputs included), update
/// internal state, and drive new outputs, which become visible at the next
/// settle point. This mirrors registered logic.
pub trait Peripheral {
    /// Returns the instance name of the model.
    ///
    /// Used for debugging and logging purposes.
    fn name(&self) -> &str;

    /// Advances the model by one rising clock edge.
    fn on_edge(&mut self);
}
