mod settings;

pub use settings::{
    LogFormat, OtelConfig, ServerConfig, Settings, StoreConfig, TemplatesConfig,
};
