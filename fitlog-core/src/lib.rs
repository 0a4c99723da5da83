pub mod dates;
pub mod db;
pub mod session;

#[cfg(feature = "uniffi")]
pub mod runtime;

#[cfg(feature = "uniffi")]
uniffi::setup_scaffolding!();
#[cfg(feature = "uniffi")]
pub mod uniffi_interface;
