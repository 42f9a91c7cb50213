use crate::cli::run;

pub mod cli;
mod config;
pub mod dataset;
pub mod domain;
mod embed;
pub mod http;
mod plot;

fn main() -> anyhow::Result<()> {
    run()
}
