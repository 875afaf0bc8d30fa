//! Command Loop: reads one line at a time, dispatches control commands and
//! requests, and guarantees exactly one terminal event per request.
//!
//! Requests are handled strictly in order. The loop only reads the next line once
//! the previous request has emitted its `end` or `error`.

use std::io::Write;
use std::time::{Duration, Instant};

use stream_event::ErrorCode;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::accumulator::{accumulate, FinalResponse};
use crate::cache::ClientCache;
use crate::emitter::Emitter;
use crate::error::BridgeError;
use crate::llm::{ChatBackend, ClientFactory};
use crate::normalize::{normalize, Normalized};
use crate::request::{Command, Request};

const DECODE_ERROR_PREFIX: &str = "JSON Decode Error";

/// Loop-level options.
#[derive(Clone, Debug, Default)]
pub struct BridgeOptions {
    /// Upper bound for one request, from dispatch to terminal event. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

/// What the loop does after a request finished.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// Owns the client cache and runs the command loop over one input/output pair.
pub struct Bridge<F: ClientFactory> {
    cache: ClientCache<F>,
    options: BridgeOptions,
    served: u64,
}

impl<F: ClientFactory> Bridge<F> {
    pub fn new(factory: F, options: BridgeOptions) -> Self {
        Self {
            cache: ClientCache::new(factory),
            options,
            served: 0,
        }
    }

    pub fn cache(&self) -> &ClientCache<F> {
        &self.cache
    }

    /// Requests handled so far, whatever their outcome.
    pub fn served(&self) -> u64 {
        self.served
    }

    /// Emits `ready`, then serves lines until EOF, `EXIT` or `shutdown`.
    ///
    /// Returns `Err` only for fatal channel errors; every per-request failure has
    /// already been reported as an `error` event.
    pub async fn run<R, W>(
        &mut self,
        mut input: R,
        emitter: &mut Emitter<W>,
        shutdown: CancellationToken,
    ) -> Result<(), BridgeError>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let provider = self.cache.factory().provider_name().to_string();
        emitter.ready(format!("{} bridge ready", provider))?;
        info!(provider = %provider, "bridge ready");

        let mut buf = Vec::new();
        loop {
            buf.clear();
            let read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("shutdown requested while idle");
                    break;
                }
                read = input.read_until(b'\n', &mut buf) => read.map_err(BridgeError::Input)?,
            };
            if read == 0 {
                debug!("input closed");
                break;
            }

            let line = match std::str::from_utf8(&buf) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "input line is not UTF-8");
                    emitter.error(
                        format!("{}: {}", DECODE_ERROR_PREFIX, e),
                        "",
                        Some(ErrorCode::MalformedInput),
                    )?;
                    continue;
                }
            };

            match Command::parse(line) {
                Ok(None) => {}
                Ok(Some(Command::Ping)) => emitter.pong()?,
                Ok(Some(Command::Exit)) => {
                    info!("EXIT received");
                    break;
                }
                Ok(Some(Command::Request(request))) => {
                    if self.handle_request(*request, emitter, &shutdown).await? == Flow::Shutdown {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "malformed input line");
                    emitter.error(
                        format!("{}: {}", DECODE_ERROR_PREFIX, e),
                        "",
                        Some(ErrorCode::MalformedInput),
                    )?;
                }
            }
        }

        info!(served = self.served, "bridge stopped");
        Ok(())
    }

    /// Runs one request to its terminal event.
    async fn handle_request<W: Write>(
        &mut self,
        request: Request,
        emitter: &mut Emitter<W>,
        shutdown: &CancellationToken,
    ) -> Result<Flow, BridgeError> {
        self.served += 1;
        let span = info_span!("request", seq = self.served);
        let limit = self.options.request_timeout;
        let started = Instant::now();

        let outcome = async {
            let work = dispatch(&mut self.cache, request, &mut *emitter);
            let bounded = async {
                match limit {
                    Some(limit) => tokio::time::timeout(limit, work)
                        .await
                        .unwrap_or(Err(BridgeError::Timeout(limit))),
                    None => work.await,
                }
            };
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => Err(BridgeError::Interrupted),
                outcome = bounded => outcome,
            }
        }
        .instrument(span.clone())
        .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(response) => {
                span.in_scope(|| {
                    info!(
                        elapsed_ms,
                        finish_reason = %response.finish_reason,
                        tool_calls = response.tool_calls.as_ref().map(Vec::len).unwrap_or(0),
                        "request completed"
                    )
                });
                emitter.end(response)?;
                Ok(Flow::Continue)
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                span.in_scope(|| warn!(elapsed_ms, error = %err, "request failed"));
                emitter.request_error(&err)?;
                if matches!(err, BridgeError::Interrupted) {
                    Ok(Flow::Shutdown)
                } else {
                    Ok(Flow::Continue)
                }
            }
        }
    }
}

/// Normalize, pick the cached client, call it, and build the final response.
async fn dispatch<F: ClientFactory, W: Write>(
    cache: &mut ClientCache<F>,
    request: Request,
    emitter: &mut Emitter<W>,
) -> Result<FinalResponse, BridgeError> {
    let Normalized { target, params } = normalize(request)?;
    debug!(
        model = %params.model,
        stream = params.stream,
        messages = params.messages.len(),
        endpoint = ?target.endpoint,
        "dispatching request"
    );
    let client = cache.get_or_create(&target.credential, target.endpoint.as_deref());

    if params.stream {
        let stream = client
            .stream(&params)
            .await
            .map_err(BridgeError::StreamOpen)?;
        accumulate(stream, emitter).await
    } else {
        let completion = client
            .complete(&params)
            .await
            .map_err(BridgeError::Completion)?;
        Ok(FinalResponse::from_completion(completion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Delta, MockBackend, MockFactory, MockStep};
    use serde_json::Value;

    async fn run_lines(factory: MockFactory, options: BridgeOptions, input: &str) -> Vec<Value> {
        let mut bridge = Bridge::new(factory, options);
        let mut emitter = Emitter::new(Vec::new());
        bridge
            .run(input.as_bytes(), &mut emitter, CancellationToken::new())
            .await
            .unwrap();
        String::from_utf8(emitter.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn ready_is_first_and_names_provider() {
        let out = run_lines(MockFactory::default(), BridgeOptions::default(), "").await;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["type"], "ready");
        assert_eq!(out[0]["message"], "Mock bridge ready");
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let out = run_lines(
            MockFactory::default(),
            BridgeOptions::default(),
            "\n   \r\nPING\n",
        )
        .await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[1]["type"], "pong");
    }

    #[tokio::test]
    async fn invalid_utf8_is_malformed_input() {
        let mut bridge = Bridge::new(MockFactory::default(), BridgeOptions::default());
        let mut emitter = Emitter::new(Vec::new());
        let input: &[u8] = b"\xff\xfe\nPING\n";

        bridge
            .run(input, &mut emitter, CancellationToken::new())
            .await
            .unwrap();

        let out: Vec<Value> = String::from_utf8(emitter.into_inner())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(out[1]["error_code"], "MALFORMED_INPUT");
        assert!(out[1]["message"]
            .as_str()
            .unwrap()
            .starts_with("JSON Decode Error: "));
        assert_eq!(out[2]["type"], "pong");
    }

    #[tokio::test]
    async fn stream_open_failure_is_remote_error() {
        let factory = MockFactory::new(MockBackend::new().failing_open("refused"));
        let out = run_lines(
            factory,
            BridgeOptions::default(),
            "{\"api_key\":\"k\",\"model\":\"m\"}\n",
        )
        .await;

        assert_eq!(out.len(), 2);
        assert_eq!(out[1]["type"], "error");
        assert_eq!(out[1]["error_code"], "REMOTE_ERROR");
        assert_eq!(out[1]["message"], "Streaming error: provider error: refused");
    }

    #[tokio::test]
    async fn completion_failure_is_remote_error() {
        let factory = MockFactory::new(MockBackend::new().failing_complete("quota"));
        let out = run_lines(
            factory,
            BridgeOptions::default(),
            "{\"api_key\":\"k\",\"model\":\"m\",\"stream\":false}\n",
        )
        .await;

        assert_eq!(out[1]["error_code"], "REMOTE_ERROR");
        assert_eq!(out[1]["message"], "Non-streaming error: provider error: quota");
    }

    #[tokio::test]
    async fn served_counts_every_request() {
        let factory = MockFactory::new(
            MockBackend::new().with_steps(vec![MockStep::Delta(Delta::content("x"))]),
        );
        let mut bridge = Bridge::new(factory, BridgeOptions::default());
        let mut emitter = Emitter::new(Vec::new());
        let input = "{\"api_key\":\"k\",\"model\":\"m\"}\n{\"model\":\"m\"}\n";

        bridge
            .run(input.as_bytes(), &mut emitter, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(bridge.served(), 2);
        assert_eq!(bridge.cache().len(), 1);
    }
}
