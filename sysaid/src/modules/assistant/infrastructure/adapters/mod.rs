pub mod reasoning;

pub use reasoning::*;
