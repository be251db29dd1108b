pub mod credentials;
pub mod gmail;
