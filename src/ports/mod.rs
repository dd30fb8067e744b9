pub mod startup;

pub use startup::Startup;
