pub mod character;
pub mod grade;
pub mod legacy;
pub mod stroke;
