mod domain;
mod mapper;
mod run;
mod writers;

pub use run::run;
