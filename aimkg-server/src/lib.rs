//! HTTP query API and batch ingestion runner over `aimkg-rs`.

pub mod config;
pub mod routes;

/// Install the JSON tracing subscriber shared by both binaries.
///
/// `RUST_LOG` takes precedence; both crates log at `info` otherwise.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("aimkg_server=info".parse()?)
                .add_directive("aimkg_rs=info".parse()?),
        )
        .json()
        .init();
    Ok(())
}
