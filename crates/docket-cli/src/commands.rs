use anyhow::Context;
use colored::Colorize;
use serde_json::json;

use docket_server::{DocketServer, ServerConfig};
use docket_types::{DocId, IdType};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args),
        Command::Config(args) => cmd_config(args, cli.format),
        Command::Id(args) => cmd_id(args, cli.format),
    }
}

fn load_config(path: Option<&std::path::Path>) -> anyhow::Result<ServerConfig> {
    match path {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(ServerConfig::default()),
    }
}

fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    tracing::info!(
        bind = %config.bind_addr,
        collections = config.collections.len(),
        "starting server"
    );
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(DocketServer::new(config).serve())?;
    Ok(())
}

fn cmd_config(args: ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(args.config.as_deref())?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        OutputFormat::Text => {
            println!("{} configuration is valid", "✓".green().bold());
            print!("{}", config.to_toml_string()?);
        }
    }
    Ok(())
}

/// Render an id lookup; split out so it can be checked without stdout.
fn describe_id(args: &IdArgs) -> anyhow::Result<(DocId, String)> {
    let id_type = args
        .id_type
        .as_deref()
        .map(str::parse::<IdType>)
        .transpose()?;
    let id = DocId::parse(&args.segment, id_type)?;
    let location = id.location(&args.base);
    Ok((id, location))
}

fn cmd_id(args: IdArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (id, location) = describe_id(&args)?;
    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "type": id.id_type().as_str(),
                "value": id.to_value(),
                "location": location,
            }))?
        ),
        OutputFormat::Text => {
            println!("type:     {}", id.id_type().as_str().cyan());
            println!("value:    {}", id.to_value().to_json());
            println!("location: {}", location.bold());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(segment: &str, id_type: Option<&str>) -> IdArgs {
        IdArgs {
            segment: segment.into(),
            id_type: id_type.map(Into::into),
            base: "/db/coll".into(),
        }
    }

    #[test]
    fn numeric_id_location() {
        let (id, location) = describe_id(&args("100", Some("NUMBER"))).unwrap();
        assert_eq!(id, DocId::Int(100));
        assert_eq!(location, "/db/coll/100?id_type=NUMBER");
    }

    #[test]
    fn inferred_string_id() {
        let (id, location) = describe_id(&args("readme", None)).unwrap();
        assert_eq!(id, DocId::String("readme".into()));
        assert_eq!(location, "/db/coll/readme");
    }

    #[test]
    fn bad_id_is_an_error() {
        assert!(describe_id(&args("abc", Some("NUMBER"))).is_err());
        assert!(describe_id(&args("abc", Some("UUID"))).is_err());
    }

    #[test]
    fn default_config_without_file() {
        let config = load_config(None).unwrap();
        assert_eq!(config.store_timeout_ms, 10_000);
    }
}
