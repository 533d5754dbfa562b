use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVES: [&str; 2] = ["tariff_dashboard=info", "village_report=info"];

/// `base` plus info-level logging for the dashboard library and its binaries.
pub fn env_filter(base: EnvFilter) -> EnvFilter {
    DEFAULT_DIRECTIVES
        .iter()
        .fold(base, |filter, directive| match directive.parse() {
            Ok(d) => filter.add_directive(d),
            Err(_) => filter,
        })
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(EnvFilter::from_default_env()))
        .with_target(false)
        .init();
}

/// Same filter, written to stderr so stdout stays free for report output.
pub fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(EnvFilter::from_default_env()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
