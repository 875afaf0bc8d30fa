//! llm-bridge binary: serves chat-completion requests from stdin, one JSON event per
//! line on stdout. Logs never reach stdout (see `config::tracing_init`).
//!
//! Exit status: 0 after EOF, `EXIT` or Ctrl-C; 1 when the provider is unavailable or
//! the output channel breaks.

use std::process::ExitCode;
use std::time::Duration;

use bridge::Emitter;
use clap::Parser;
use cli::{report_missing_provider, serve, Args, Provider, RunSettings, APP_NAME};
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;

/// Grace period for blocking stdin reads after the loop has stopped.
const SHUTDOWN_GRACE: Duration = Duration::from_millis(200);

fn main() -> ExitCode {
    // Config before clap so `.env` / `[env]` values feed the `env = ...` fallbacks.
    let file_settings = match config::load_and_apply(APP_NAME, None) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}: ignoring config: {}", APP_NAME, e);
            config::BridgeSettings::default()
        }
    };
    let settings = RunSettings::resolve(Args::parse(), file_settings);

    let _log_guard = match config::tracing_init::init(settings.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{}: logging disabled: {}", APP_NAME, e);
            None
        }
    };

    let mut emitter = Emitter::new(std::io::stdout());
    let provider: Provider = match settings.provider.parse() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "provider unavailable");
            if let Err(io) = report_missing_provider(&mut emitter, &e) {
                eprintln!("{}: {}", APP_NAME, io);
            }
            return ExitCode::from(1);
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: start runtime: {}", APP_NAME, e);
            return ExitCode::from(1);
        }
    };

    let result = runtime.block_on(async {
        let shutdown = CancellationToken::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received");
                trigger.cancel();
            }
        });

        tracing::info!(
            provider = provider.name(),
            timeout_secs = settings.request_timeout.map(|d| d.as_secs()),
            "starting bridge"
        );
        let stdin = BufReader::new(tokio::io::stdin());
        serve(provider, &settings, stdin, &mut emitter, shutdown).await
    });
    // A pending stdin read sits on a blocking thread; don't wait for it.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "bridge stopped on fatal error");
            eprintln!("{}: {}", APP_NAME, e);
            ExitCode::from(1)
        }
    }
}
