pub mod gate;
pub mod introspect;
pub mod overview;

pub use gate::{Access, AccessGate};
pub use overview::{DatabaseOverview, TableSummary};
