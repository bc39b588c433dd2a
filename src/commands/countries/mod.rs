mod domain;
mod mapper;
mod run;
#[cfg(test)]
mod tests;
mod writers;

pub use run::run;
