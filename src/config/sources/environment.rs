//! Environment source: RETRANS__SECTION__KEY, e.g. RETRANS__PROVIDER__MODEL.

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::Environment;

const ENV_PREFIX: &str = "RETRANS";

pub fn add_to_builder(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
    builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    )
}
