use clap::Parser;
use color_eyre::eyre::Result;
use log::*;
use std::rc::Rc;

use proteus::{
    Outcome, ProteusError, Workflow,
    cli::Args,
    config::Config,
    forge::{github::Github, traits::Forge},
    repo::{Repository, VersionControl},
};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("proteus")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    initialize_logger(args.debug)?;

    let config_path = if args.config.is_relative() {
        args.workdir.join(&args.config)
    } else {
        args.config.clone()
    };

    let config = Config::load(&config_path)?;
    let remote = args.get_remote(&config.forge)?;

    let repo = Repository::open(&args.workdir, remote.token.clone())?;
    let workdir = repo.workdir()?.to_path_buf();

    let forge: Rc<dyn Forge> = Rc::new(Github::new(remote)?);
    let vcs: Rc<dyn VersionControl> = Rc::new(repo);

    let workflow = Workflow::builder()
        .config(Rc::new(config))
        .forge(forge)
        .vcs(vcs)
        .workdir(workdir)
        .pr_number(args.pr.clone())
        .build()?;

    match workflow.run().await {
        Ok(Outcome::Skipped { target }) => {
            info!("skipped pull request targeting {target}")
        }
        Ok(Outcome::Commented { classification }) => info!(
            "pull request validated: {} -> {}",
            classification.current, classification.next
        ),
        Ok(Outcome::Published { version, tag, .. }) => {
            info!("released {version} as {tag}")
        }
        Err(ProteusError::NoPullRequestFound) => {
            warn!("{}", ProteusError::NoPullRequestFound)
        }
        Err(err) => return Err(err.into()),
    }

    Ok(())
}
