//! Library side of the `llm-bridge` binary: argument/config merge, provider
//! resolution, and the stdin/stdout serve entry point.

pub mod args;
pub mod provider;

pub use args::{Args, RunSettings};
pub use provider::{Provider, UnknownProvider, DEFAULT_PROVIDER};

use std::io::Write;

use bridge::{Bridge, BridgeError, BridgeOptions, ClientFactory, Emitter, OpenAiFactory};
use tokio::io::AsyncBufRead;
use tokio_util::sync::CancellationToken;

pub const APP_NAME: &str = "llm-bridge";

/// Runs the command loop for `provider` over the given channels.
pub async fn serve<R, W>(
    provider: Provider,
    settings: &RunSettings,
    input: R,
    emitter: &mut Emitter<W>,
    shutdown: CancellationToken,
) -> Result<(), BridgeError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let options = BridgeOptions {
        request_timeout: settings.request_timeout,
    };
    match provider {
        Provider::OpenAi => {
            let mut factory = OpenAiFactory::new();
            if let Some(base) = &settings.default_base_url {
                factory = factory.with_default_base_url(base.clone());
            }
            run_with(factory, options, input, emitter, shutdown).await
        }
    }
}

async fn run_with<F, R, W>(
    factory: F,
    options: BridgeOptions,
    input: R,
    emitter: &mut Emitter<W>,
    shutdown: CancellationToken,
) -> Result<(), BridgeError>
where
    F: ClientFactory,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    Bridge::new(factory, options)
        .run(input, emitter, shutdown)
        .await
}

/// Reports an unavailable provider on the output channel.
pub fn report_missing_provider<W: Write>(
    emitter: &mut Emitter<W>,
    err: &UnknownProvider,
) -> std::io::Result<()> {
    emitter.error(err.to_string(), "", Some(err.error_code()))
}
