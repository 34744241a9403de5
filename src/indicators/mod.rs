// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free numeric functions over ordered price/volume slices.
// Every public function returns `Option<T>` so callers are forced to handle
// insufficient-data and numerical-edge-case scenarios; nothing in this module
// ever produces a NaN or infinity for a `Some` result.

pub mod momentum;
pub mod range;
pub mod rsi;
pub mod sma;
pub mod volatility;
pub mod volume;
