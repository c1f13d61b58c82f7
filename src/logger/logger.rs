use anyhow::{Result, anyhow};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt, layer::Layered, layer::SubscriberExt, reload, util::SubscriberInitExt,
};

pub struct LogConfig {
    pub filter: String,
    pub ansi: bool,
}

type Filtered = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type FmtLayer = Box<dyn Layer<Filtered> + Send + Sync>;

/// Global subscriber whose filter and formatting can be swapped once the
/// settings file has been read.
pub struct Logger {
    filter_handle: reload::Handle<EnvFilter, Registry>,
    fmt_handle: reload::Handle<FmtLayer, Filtered>,
}

impl Logger {
    pub fn new_bootstrap() -> Self {
        let filter = EnvFilter::new("info");
        let (filter, filter_handle) = reload::Layer::new(filter);
        let (fmt, fmt_handle) = reload::Layer::new(Self::fmt_layer(true));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt)
            .init();

        Self {
            filter_handle,
            fmt_handle,
        }
    }

    fn fmt_layer(ansi: bool) -> FmtLayer {
        fmt::layer().with_ansi(ansi).boxed()
    }

    pub fn reload_from_config(&self, config: &LogConfig) -> Result<()> {
        let filter = EnvFilter::try_new(&config.filter).map_err(|e| anyhow!(e))?;
        self.filter_handle.reload(filter).map_err(|e| anyhow!(e))?;
        self.fmt_handle
            .reload(Self::fmt_layer(config.ansi))
            .map_err(|e| anyhow!(e))?;
        Ok(())
    }
}
