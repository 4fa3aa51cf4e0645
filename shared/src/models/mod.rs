//! Domain models for farm stock conversion and adjustment

mod adjustment;
mod audit;
mod bom;
mod conversion;
mod freshness;
mod item;

pub use adjustment::*;
pub use audit::*;
pub use bom::*;
pub use conversion::*;
pub use freshness::*;
pub use item::*;
