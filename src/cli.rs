use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Generate OpenSSL request configs and CSRs, optionally covering
/// several domains as Subject Alternative Names.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
    /// the settings file.
    #[arg(long, global = true, value_name = "FILE")]
    pub settings: Option<PathBuf>,
    /// directory profiles are read from and files are written to.
    #[arg(
        long,
        short,
        global = true,
        default_value = ".",
        value_name = "DIR",
        value_hint = clap::ValueHint::DirPath,
    )]
    pub workdir: PathBuf,
    /// more output, repeat for more detail.
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    /// only print errors.
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an organization profile (<org>_gen_config)
    Config(ConfigArgs),
    /// Create a key (unless one is given) and a CSR
    Csr(CsrArgs),
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Country short code
    #[arg(long, short)]
    pub country: Option<String>,
    /// Locality/City
    #[arg(long, short)]
    pub locality: Option<String>,
    /// State Name
    #[arg(long, short)]
    pub state: Option<String>,
    /// Organization Name
    #[arg(long, short)]
    pub org: String,
    /// ask for the fields not given on the command line
    #[arg(long, short)]
    pub interactive: bool,
}

#[derive(Args, Debug)]
pub struct CsrArgs {
    /// Specify a domain or a file with list of domains
    #[arg(long, short)]
    pub domain: String,
    /// Specify a key
    #[arg(long, short, value_hint = clap::ValueHint::FilePath)]
    pub key: Option<PathBuf>,
    /// Organization Name
    #[arg(long, short)]
    pub org: Option<String>,
    /// write the request config and show the openssl calls without running them
    #[arg(long)]
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use clap::{error::ErrorKind, CommandFactory};

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn config_requires_an_organization() {
        let err = Cli::try_parse_from(["csrgen", "config", "-c", "US"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn config_takes_all_dn_fields() {
        let cli = Cli::try_parse_from([
            "csrgen", "config", "-c", "US", "-l", "Springfield", "-s", "Illinois", "-o", "Acme",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Config(args)) => {
                assert_eq!(args.country.as_deref(), Some("US"));
                assert_eq!(args.locality.as_deref(), Some("Springfield"));
                assert_eq!(args.state.as_deref(), Some("Illinois"));
                assert_eq!(args.org, "Acme");
                assert!(!args.interactive);
            }
            other => panic!("expected config, got {other:?}"),
        }
    }

    #[test]
    fn csr_requires_a_domain() {
        let err = Cli::try_parse_from(["csrgen", "csr", "-o", "Acme"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["csrgen", "csr", "-d", "example.com", "-k", "site.key"])
            .unwrap();
        match cli.command {
            Some(Commands::Csr(args)) => {
                assert_eq!(args.domain, "example.com");
                assert_eq!(args.key, Some(PathBuf::from("site.key")));
                assert_eq!(args.org, None);
                assert!(!args.dry_run);
            }
            other => panic!("expected csr, got {other:?}"),
        }
    }

    #[test]
    fn no_subcommand_parses_to_none() {
        let cli = Cli::try_parse_from(["csrgen"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.workdir, PathBuf::from("."));
    }
}
