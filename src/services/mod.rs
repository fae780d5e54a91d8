pub mod appointments;
pub mod patients;

pub use appointments::{AppointmentService, CreateAppointment, UpdateAppointment};
pub use patients::{PatientInput, PatientService};
