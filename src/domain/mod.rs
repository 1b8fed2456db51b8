pub mod common;
pub mod usuario;
pub mod mascota;
pub mod cita;
pub mod historial;
pub mod session;

pub use common::RecordId;
pub use usuario::model::Rol;
