pub mod status;

pub use status::StatusService;
