//! The main entrypoint for vbrepo, maintaining local virt-builder repositories.

use anyhow::Result;
use clap::Parser;
use vbrepo_lib::cli::Opt;

fn run() -> Result<()> {
    let opt = Opt::parse();
    vbrepo_utils::initialize_tracing(opt.debug);
    tracing::trace!("starting {}", vbrepo_utils::NAME);
    vbrepo_lib::run(&opt)
}

fn main() {
    vbrepo_utils::run_main(run)
}
