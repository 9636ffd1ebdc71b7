use std::process;

use clap::{CommandFactory, Parser};
use directories::ProjectDirs;
use tracing::Level;

use cert_sign_request::dn::OrganizationProfile;
use cli::{Cli, Commands};
use config::read_config;
use openssl::Openssl;
use run::{CsrPlan, ProfilePlan};

mod cert_sign_request;
mod cli;
mod config;
mod error;
mod openssl;
mod run;
mod utils;

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        process::exit(2);
    };

    let app = ProjectDirs::from("com", "csrgen", "csrgen");
    let config = read_config(
        app.as_ref().map(|app| app.config_dir()),
        cli.settings.as_deref(),
    )?;

    match command {
        Commands::Config(args) => {
            let profile = OrganizationProfile {
                country: trimmed(args.country),
                locality: trimmed(args.locality),
                state: trimmed(args.state),
                ..OrganizationProfile::new(args.org.trim())
            };
            let plan = ProfilePlan {
                profile,
                interactive: args.interactive,
            };
            let path = run::profile_run(plan, &cli.workdir)?;
            println!("Created organization profile {}", path.display());
        }
        Commands::Csr(args) => {
            let plan = CsrPlan {
                domain: args.domain.trim().to_owned(),
                key: args.key,
                org: trimmed(args.org),
                dry_run: args.dry_run,
            };
            let mut tool = Openssl::new(&config.openssl.binary);
            let outcome = run::csr_run(&plan, &config, &cli.workdir, &mut tool)?;
            if plan.dry_run {
                println!("Wrote {}", outcome.config.display());
                for invocation in &outcome.invocations {
                    println!("would run: {} {invocation}", tool.binary().display());
                }
            } else {
                println!("Request config: {}", outcome.config.display());
                println!("Private key:    {}", outcome.key.display());
                println!("CSR:            {}", outcome.csr.display());
            }
        }
    }

    Ok(())
}
