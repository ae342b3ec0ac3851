pub mod events;
pub mod parcel;
pub mod stats;

pub use events::*;
pub use parcel::*;
pub use stats::*;
