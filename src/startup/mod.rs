pub mod startup;

pub use startup::Application;
