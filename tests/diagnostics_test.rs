//! Diagnostics tests
//!
//! Everything the agent has to say outside the protocol goes through tracing.
//! These tests capture it to check that skipped lines and dropped responses
//! are visible there.

use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;

use lfs_rsync_agent::{Agent, AgentConfig, RsyncTransfer};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
	fn text(&self) -> String {
		String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
	}
}

impl io::Write for Captured {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.0.lock().unwrap().extend_from_slice(buf);
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		Ok(())
	}
}

fn capture(level: &str) -> (Captured, tracing::subscriber::DefaultGuard) {
	let captured = Captured::default();
	let writer = captured.clone();
	let subscriber = tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::new(level))
		.with_ansi(false)
		.with_writer(move || writer.clone())
		.finish();
	let guard = tracing::subscriber::set_default(subscriber);
	(captured, guard)
}

struct ClosedPipe;

impl AsyncWrite for ClosedPipe {
	fn poll_write(self: Pin<&mut Self>, _: &mut Context<'_>, _: &[u8]) -> Poll<io::Result<usize>> {
		Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer went away")))
	}

	fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
		Poll::Ready(Ok(()))
	}

	fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<io::Result<()>> {
		Poll::Ready(Ok(()))
	}
}

#[tokio::test]
async fn test_malformed_line_is_logged_with_content() {
	let (logs, _guard) = capture("debug");
	let mut agent = Agent::new(Some("/backup/lfs".to_string()), RsyncTransfer::default());

	let mut out: Vec<u8> = Vec::new();
	agent.run(&b"{\"event\": oops\n"[..], &mut out).await.unwrap();

	assert!(out.is_empty());
	let text = logs.text();
	assert!(text.contains("Unable to parse request"), "logs: {}", text);
	assert!(text.contains("oops"), "logs: {}", text);
}

#[tokio::test]
async fn test_sent_messages_are_echoed() {
	let (logs, _guard) = capture("debug");
	let mut agent = Agent::new(Some("/backup/lfs".to_string()), RsyncTransfer::default());

	let mut out: Vec<u8> = Vec::new();
	let input = b"{\"event\":\"init\",\"operation\":\"upload\"}\n{\"event\":\"terminate\"}\n";
	agent.run(&input[..], &mut out).await.unwrap();

	assert_eq!(out, b"{}\n");
	let text = logs.text();
	assert!(text.contains("Initialising rsync agent for: upload"), "logs: {}", text);
	assert!(text.contains("Sent message {}"), "logs: {}", text);
	assert!(text.contains("Terminating rsync agent gracefully."), "logs: {}", text);
}

#[tokio::test]
async fn test_responses_echoed_at_default_level() {
	let (logs, _guard) = capture(&AgentConfig::default().log_level);
	let mut agent = Agent::new(Some("/backup/lfs".to_string()), RsyncTransfer::default());

	let mut out: Vec<u8> = Vec::new();
	let input = b"{\"event\":\"init\",\"operation\":\"download\"}\n{\"event\":\"terminate\"}\n";
	agent.run(&input[..], &mut out).await.unwrap();

	assert_eq!(out, b"{}\n");
	let text = logs.text();
	assert!(text.contains("Sent message {}"), "logs: {}", text);
	assert!(!text.contains("Dispatching"), "debug output leaked at default level: {}", text);
}

#[tokio::test]
async fn test_write_failure_is_logged_not_fatal() {
	let (logs, _guard) = capture("debug");
	let mut agent = Agent::new(Some("/backup/lfs".to_string()), RsyncTransfer::default());

	let input = b"{\"event\":\"init\",\"operation\":\"upload\"}\n{\"event\":\"terminate\"}\n";
	let end = agent.run(&input[..], &mut ClosedPipe).await;

	assert!(end.is_ok());
	assert_eq!(agent.stats().responses_dropped, 1);
	let text = logs.text();
	assert!(text.contains("Unable to send response"), "logs: {}", text);
	assert!(text.contains("peer went away"), "logs: {}", text);
}

// vim: ts=4
