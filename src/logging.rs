use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "hoops_edge=info";

/// Install the stderr subscriber shared by every binary. `RUST_LOG` wins over
/// `DEFAULT_FILTER`; stdout stays free for reports and summaries. A second
/// call is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_tracing();
        init_tracing();
        tracing::info!("subscriber installed");
    }
}
