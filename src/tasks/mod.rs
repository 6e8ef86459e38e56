pub mod build;
pub mod checkout;
pub mod doctor;
pub mod environment;
pub mod rpmalloc;
pub mod run;
pub mod toolchain;
pub mod upload;
