//! dh-iframe-url: print the iframe URL for an object bound in a remote session.
//!
//! Runs the same pipeline as the console widget against a point-to-point
//! session, including the `DEEPHAVEN_IPY_URL` and settings overrides.

use std::convert::Infallible;

use anyhow::Result;
use clap::Parser;
use deephaven_widget::session::ENVOY_PREFIX_HEADER;
use deephaven_widget::{
    DeephavenWidget, DirectSession, DisplayTarget, ObjectRegistry, Settings, ShutdownHooks,
    StaticServer, ViewState, WidgetHost, WidgetOptions,
};
use log::debug;

#[derive(Parser, Debug)]
#[command(name = "dh-iframe-url")]
#[command(about = "Print the iframe URL for a Deephaven object bound in a remote session")]
struct Cli {
    /// Server host
    #[arg(long, default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(long, default_value = "10000")]
    port: u16,

    /// Name the object is bound under in the session
    #[arg(long)]
    name: String,

    /// Routing prefix of an intermediary proxy
    #[arg(long)]
    envoy_prefix: Option<String>,

    /// Iframe width (0 = full width)
    #[arg(long)]
    width: Option<u32>,

    /// Iframe height
    #[arg(long)]
    height: Option<u32>,

    /// Print every widget attribute as JSON
    #[arg(long)]
    json: bool,

    /// Log level
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let mut session = DirectSession::new(cli.host.clone(), cli.port);
    if let Some(prefix) = &cli.envoy_prefix {
        session = session.with_header(ENVOY_PREFIX_HEADER, prefix.as_bytes());
    }

    let settings = Settings::load();
    let options = WidgetOptions::from_settings(&settings).with_size(cli.width, cli.height);
    debug!("Options: {:?}", options);

    let registry: ObjectRegistry<Infallible> = ObjectRegistry::new();
    let hooks = ShutdownHooks::new();
    let host = WidgetHost {
        registry: &registry,
        // Only consulted for in-process objects, which this tool never has
        local_server: &StaticServer(cli.port),
        proxy: None,
        hooks: &hooks,
    };

    let widget = DeephavenWidget::create(
        DisplayTarget::<Infallible>::Named(&cli.name),
        Some(&session),
        &options,
        &host,
        Box::new(ViewState::new()),
    )?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&widget.state())?);
    } else {
        println!("{}", widget.attributes().iframe_url);
    }

    hooks.notify_all();
    Ok(())
}
