use crate::environment::{EnvSource, ProcessEnv};
use crate::error::{ConfigError, format_config_errors};
use crate::flags::{FlagOutcome, FlagRegistry};
use crate::loader::{CommandLineLoader, Loader};
use crate::schema::{Bindable, Schema};
use crate::store::ValueStore;
use crate::Config;
use std::ffi::OsString;
use std::sync::Arc;
use std::{fmt, fs, io, path::Path, process};

/// Wires a config value to defaults, environment variables, command-line
/// flags and any number of loaders.
///
/// # Example
/// ```no_run
/// use config_bindr::{Bindable, Config, ConfigError, DocumentLoader, CommandLineLoader, Manager};
/// use serde::Serialize;
/// use std::time::Duration;
///
/// #[derive(Debug, Default, Bindable, Serialize)]
/// struct ServiceConfig {
///     #[config("env=TIMEOUT;default=100ms;usage=Timeout for service")]
///     timeout: Duration,
///     #[config("default=test;usage=Name of service")]
///     name: String,
/// }
///
/// impl Config for ServiceConfig {
///     fn validate(&self) -> Result<(), ConfigError> {
///         Ok(())
///     }
/// }
///
/// let manager = Manager::new("service", "An example service").with_loaders(vec![
///     Box::new(DocumentLoader::stdin()),
///     Box::new(CommandLineLoader),
/// ]);
/// let mut config = ServiceConfig::default();
/// manager.load(&mut config).unwrap();
/// ```
pub struct Manager {
    app_name: String,
    description: String,
    version: Option<String>,
    loaders: Vec<Box<dyn Loader>>,
    env: Arc<dyn EnvSource>,
    dotenv: bool,
}

impl Manager {
    /// Create a manager whose only loader is the [`CommandLineLoader`]
    pub fn new(app_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            description: description.into(),
            version: None,
            loaders: vec![Box::new(CommandLineLoader)],
            env: Arc::new(ProcessEnv),
            dotenv: true,
        }
    }

    /// Replace the loader list; loaders run in the given order, last one wins
    pub fn with_loaders(mut self, loaders: Vec<Box<dyn Loader>>) -> Self {
        self.loaders = loaders;
        self
    }

    /// Append a loader after the existing ones
    pub fn with_loader(mut self, loader: impl Loader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }

    /// Enable `--version`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Look environment variables up in `env` instead of the process environment
    pub fn with_env_source(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Whether to read a `.env` file before binding the environment (default: on)
    pub fn with_dotenv(mut self, enabled: bool) -> Self {
        self.dotenv = enabled;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// Load `config` using the arguments of the current process
    ///
    /// Exits the process with status 0 after printing usage when `--help`
    /// (or `--version`) is passed.
    ///
    /// # Panics
    ///
    /// Panics when a declared default does not parse for its field, since
    /// that is a defect in the config type rather than bad input.
    pub fn load<C: Config>(&self, config: &mut C) -> Result<(), ConfigError> {
        self.load_from(config, std::env::args_os())
    }

    /// Like [`load`](Self::load) with explicit arguments; the first one is
    /// the program name
    pub fn load_from<C, I, T>(&self, config: &mut C, args: I) -> Result<(), ConfigError>
    where
        C: Config,
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        tracing::debug!(app = %self.app_name, "loading configuration");
        let mut store = self.prepare_store();
        let mut flags = self.flag_registry();
        self.register(config, &mut store, Some(&mut flags))?;

        match flags.parse(args)? {
            FlagOutcome::Exit(text) => {
                print!("{text}");
                process::exit(0);
            }
            FlagOutcome::Values(values) => {
                for (key, value) in values {
                    store.set_flag(&key, value);
                }
            }
        }

        self.run_loaders(config, &mut store)
    }

    /// Run only the loaders, for callers that parse flags themselves
    ///
    /// Defaults and environment bindings are still seeded into the store so
    /// the loaders can resolve through it; no flags are registered or parsed.
    pub fn load_only<C: Bindable>(&self, config: &mut C) -> Result<(), ConfigError> {
        let mut store = self.prepare_store();
        self.register(config, &mut store, None)?;
        self.run_loaders(config, &mut store)
    }

    /// Help text the flag parser would print for `config`
    ///
    /// Declared defaults are written into `config` as a side effect.
    pub fn usage<C: Bindable>(&self, config: &mut C) -> Result<String, ConfigError> {
        let mut store = self.prepare_store();
        let mut flags = self.flag_registry();
        self.register(config, &mut store, Some(&mut flags))?;
        Ok(flags.render_help())
    }

    fn prepare_store(&self) -> ValueStore {
        if self.dotenv {
            let _ = dotenvy::dotenv();
        }
        ValueStore::with_env(Arc::clone(&self.env))
    }

    fn flag_registry(&self) -> FlagRegistry {
        FlagRegistry::new(&self.app_name, &self.description, self.version.as_deref())
    }

    fn register(
        &self,
        config: &mut dyn Bindable,
        store: &mut ValueStore,
        mut flags: Option<&mut FlagRegistry>,
    ) -> Result<(), ConfigError> {
        let mut schema = Schema::walk(config)?;

        for field in schema.iter_mut() {
            let key = field.key();
            match field.apply_default() {
                Ok(Some(default)) => store.set_default(&key, default),
                Ok(None) => {}
                Err(err) => halt(err),
            }

            let env_name = field.env_name();
            tracing::debug!(field = field.name(), flag = %field.flag_name(), env = %env_name, "registered field");
            store.bind_env(&key, env_name);
            if let Some(url) = &field.meta().url {
                store.bind_url(&key, url.clone());
            }
            if let Some(flags) = flags.as_deref_mut() {
                flags.register(field)?;
            }
        }
        Ok(())
    }

    fn run_loaders(&self, config: &mut dyn Bindable, store: &mut ValueStore) -> Result<(), ConfigError> {
        for loader in &self.loaders {
            tracing::debug!(loader = loader.name(), "running loader");
            loader.load(config, store).inspect_err(|err| {
                tracing::error!(loader = loader.name(), error = %err, "loader failed");
            })?;
        }
        Ok(())
    }

    /// Render a markdown summary of every field `config` declares
    pub fn render_docs<C: Bindable>(&self, config: &mut C) -> Result<String, ConfigError> {
        let schema = Schema::walk(config)?;
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", self.app_name));
        if !self.description.is_empty() {
            md.push_str(&format!("{}\n\n", self.description));
        }

        md.push_str("## Configuration Summary\n\n");
        md.push_str("| Flag | Environment | Type | Required | Default | Description |\n");
        md.push_str("|------|-------------|------|----------|---------|-------------|\n");
        for field in schema.iter() {
            let meta = field.meta();
            let flag = match meta.short {
                Some(short) => format!("`--{}`, `-{}`", field.flag_name(), short),
                None => format!("`--{}`", field.flag_name()),
            };
            let required_str = if meta.required { "Yes" } else { "No" };
            let default_display = match meta.default.as_deref() {
                None | Some("") => "-".to_string(),
                Some(default) => format!("`{}`", default),
            };
            md.push_str(&format!(
                "| {} | `{}` | {} | {} | {} | {} |\n",
                flag,
                field.env_name(),
                field.type_name(),
                required_str,
                default_display,
                meta.usage
            ));
        }

        let remote: Vec<_> = schema
            .iter()
            .filter_map(|field| Some((field.flag_name(), field.meta().url.as_deref()?)))
            .collect();
        if !remote.is_empty() {
            md.push_str("\n## External Keys\n\n");
            md.push_str("| Flag | URL key |\n");
            md.push_str("|------|---------|\n");
            for (flag, url) in remote {
                md.push_str(&format!("| `--{}` | `{}` |\n", flag, url));
            }
        }

        Ok(md)
    }

    /// Write [`render_docs`](Self::render_docs) output to a file
    ///
    /// # Example
    /// ```no_run
    /// # use config_bindr::{Bindable, Manager};
    /// # #[derive(Default, Bindable)]
    /// # struct ServiceConfig {
    /// #     #[config("default=8080;usage=Server port")]
    /// #     port: u16,
    /// # }
    /// let manager = Manager::new("service", "An example service");
    /// manager.write_docs(&mut ServiceConfig::default(), "CONFIG.md").unwrap();
    /// ```
    pub fn write_docs<C: Bindable>(&self, config: &mut C, path: impl AsRef<Path>) -> io::Result<()> {
        let md = self.render_docs(config).map_err(io::Error::other)?;
        fs::write(path, md)
    }
}

impl fmt::Debug for Manager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("app_name", &self.app_name)
            .field("version", &self.version)
            .field(
                "loaders",
                &self.loaders.iter().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .field("dotenv", &self.dotenv)
            .finish_non_exhaustive()
    }
}

/// Stop start-up on a defect in the declared schema
fn halt(err: ConfigError) -> ! {
    tracing::error!(error = %err, "invalid default in configuration schema");
    panic!("{}", format_config_errors(&[err]));
}
