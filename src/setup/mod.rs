pub mod wizard;

pub use wizard::{run_setup_wizard, run_setup_wizard_with};
