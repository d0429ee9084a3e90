pub mod appointment;
pub mod doctor;
pub mod enums;
pub mod envelope;

pub use appointment::*;
pub use doctor::*;
pub use enums::*;
pub use envelope::*;
