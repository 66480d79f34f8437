use config_bindr::{
    Bindable, CommandLineLoader, Config, ConfigError, DocumentLoader, Manager, MapObject,
};
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Default, Bindable, Serialize)]
pub struct ServerConfig {
    #[config("default=localhost;usage=Address to listen on")]
    pub host: String,

    #[config("env=PORT;default=8080;usage=Port to listen on;short=p")]
    pub port: u16,
}

#[derive(Debug, Default, Bindable, Serialize)]
pub struct ExampleConfig {
    #[config("env=TIMEOUT;default=100ms;usage=Timeout for service;short=t")]
    pub timeout: Duration,

    #[config("default=test;usage=Name of service;required")]
    pub name: String,

    #[config(r#"default={"team":"core"};usage=Labels attached to every request"#)]
    pub labels: MapObject,

    #[config("default=foo,bar,baz;usage=Upstream peers;url=service/peers")]
    pub peers: Vec<String>,

    #[config(flatten)]
    pub server: ServerConfig,

    #[config("default=false;usage=Enable verbose responses")]
    pub verbose: bool,
}

impl Config for ExampleConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "name must not be empty".to_string(),
            });
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::Validation {
                message: "timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

fn init_tracing() {
    let default_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let manager = Manager::new("util-cli", "Example service configured from flags, env and stdin")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_loaders(vec![
            Box::new(DocumentLoader::stdin()),
            Box::new(CommandLineLoader),
        ]);

    if std::env::args().nth(1).as_deref() == Some("docs") {
        generate_docs(&manager);
        return;
    }

    let mut config = ExampleConfig::default();
    if let Err(err) = manager.load(&mut config).and_then(|_| config.validate()) {
        eprintln!("{}", config_bindr::format_config_errors(&[err]));
        std::process::exit(1);
    }

    match config.dump_json() {
        Ok(json) => println!("{json}"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

fn generate_docs(manager: &Manager) {
    println!("Generating documentation for ExampleConfig...");
    match manager.write_docs(&mut ExampleConfig::default(), "CONFIG.md") {
        Ok(_) => println!("✓ Documentation written to CONFIG.md"),
        Err(e) => eprintln!("✗ Failed to write documentation: {}", e),
    }
}
