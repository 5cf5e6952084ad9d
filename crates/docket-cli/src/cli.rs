use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "docket",
    about = "Docket: a document store with conditional writes over HTTP",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the Docket server
    Serve(ServeArgs),
    /// Validate a configuration file and print the effective settings
    Config(ConfigArgs),
    /// Resolve a document id the way the server reads it from a URL
    Id(IdArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Address to listen on; overrides the configuration file
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct IdArgs {
    /// The id path segment
    pub segment: String,
    /// Explicit id type (STRING, NUMBER, OID, DATE, BOOLEAN, NULL, MINKEY, MAXKEY)
    #[arg(long = "id-type")]
    pub id_type: Option<String>,
    /// Collection path the location is built on
    #[arg(long, default_value = "/db/coll")]
    pub base: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve() {
        let cli = Cli::try_parse_from(["docket", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind, Some("0.0.0.0:9000".parse().unwrap()));
            assert!(args.config.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_serve_with_config() {
        let cli = Cli::try_parse_from(["docket", "serve", "-c", "docket.toml"]).unwrap();
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.config, Some(PathBuf::from("docket.toml")));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn reject_bad_bind() {
        assert!(Cli::try_parse_from(["docket", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn parse_id() {
        let cli =
            Cli::try_parse_from(["docket", "id", "100", "--id-type", "NUMBER", "--format", "json"])
                .unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        if let Command::Id(args) = cli.command {
            assert_eq!(args.segment, "100");
            assert_eq!(args.id_type.as_deref(), Some("NUMBER"));
            assert_eq!(args.base, "/db/coll");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["docket", "config", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
