pub mod hanja_id;
pub mod log;
pub mod response;
