//! Proxy composition root
//!
//! Owns the transport and the two pump threads, and creates one
//! [`RequestHandler`] per accepted command. The wire dialect is chosen once,
//! at construction.

use crate::config::Config;
use crate::core::session::Session;
use crate::core::types::{Command, CommandResult};
use crate::error::{Error, Result};
use crate::proxy::completion::CompletionSlot;
use crate::proxy::context::{Endpoint, ProxyContext};
use crate::proxy::dispatcher::DispatchPump;
use crate::proxy::handler::RequestHandler;
use crate::proxy::queue::inbound_queue;
use crate::proxy::receiver::ReceivePump;
use crate::proxy::registry::SequenceRegistry;
use crate::transport::{Transport, UdpTransport};
use crate::translator::{CommandTranslator, create_translator};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// CIL proxy server with receiver and dispatcher threads
pub struct ProxyServer {
    context: Arc<ProxyContext>,
    /// Cleared to stop both pumps
    running: Arc<AtomicBool>,
    receiver_handle: Option<JoinHandle<()>>,
    dispatcher_handle: Option<JoinHandle<()>>,
}

impl ProxyServer {
    /// Bind the UDP transport, pick the configured dialect and start both pumps
    pub fn start(config: &Config) -> Result<Self> {
        config.validate()?;
        let translator = create_translator(&config.proxy.dialect)?;
        let transport = UdpTransport::bind(
            config.network.local_port,
            &config.network.remote_host,
            config.network.remote_port,
            config.network.read_timeout(),
        )?;
        Self::with_transport(config, Arc::new(transport), translator)
    }

    /// Start over an existing transport and translator
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn Transport>,
        translator: Arc<dyn CommandTranslator>,
    ) -> Result<Self> {
        let registry = Arc::new(SequenceRegistry::new(config.proxy.start_sequence));
        log::info!(
            "Starting CIL proxy (dialect {}, start sequence {})",
            translator.name(),
            config.proxy.start_sequence
        );

        let context = Arc::new(ProxyContext::new(
            Arc::clone(&registry),
            translator,
            Arc::clone(&transport),
            Endpoint::from(&config.network),
            config.proxy.clone(),
        ));

        let running = Arc::new(AtomicBool::new(true));
        let (queue_tx, queue_rx) = inbound_queue();

        let receiver_running = Arc::clone(&running);
        let receiver_transport = Arc::clone(&transport);
        let receive_buffer = config.network.receive_buffer;
        let receiver_handle = thread::Builder::new()
            .name("cil-receiver".to_string())
            .spawn(move || {
                let mut pump = ReceivePump::new(
                    receiver_transport,
                    queue_tx,
                    receiver_running,
                    receive_buffer,
                );
                pump.run();
            })
            .map_err(|e| Error::Other(format!("Failed to spawn receiver thread: {}", e)))?;

        let dispatcher_running = Arc::clone(&running);
        let poll = config.proxy.dispatch_poll();
        let dispatcher_handle = thread::Builder::new()
            .name("cil-dispatcher".to_string())
            .spawn(move || {
                let mut pump = DispatchPump::new(registry, queue_rx, dispatcher_running, poll);
                pump.run();
            });
        let dispatcher_handle = match dispatcher_handle {
            Ok(handle) => handle,
            Err(e) => {
                running.store(false, Ordering::Relaxed);
                transport.close();
                let _ = receiver_handle.join();
                return Err(Error::Other(format!(
                    "Failed to spawn dispatcher thread: {}",
                    e
                )));
            }
        };

        Ok(Self {
            context,
            running,
            receiver_handle: Some(receiver_handle),
            dispatcher_handle: Some(dispatcher_handle),
        })
    }

    /// Create, register and send a handler for `command`
    ///
    /// Returns immediately; the outcome reaches `session` asynchronously
    /// (or synchronously for translation and transmit failures).
    pub fn submit(&self, command: Command, session: Arc<dyn Session>) -> Arc<RequestHandler> {
        let handler = RequestHandler::create(&self.context, command, session);
        handler.send();
        handler
    }

    /// Submit `command` and block until its final result
    ///
    /// Waits for the handler's handling time, extended by keep-alives.
    pub fn execute(&self, command: Command) -> CommandResult {
        let slot = CompletionSlot::new();
        let handler = self.submit(command, slot.clone());
        let result = slot.wait(handler.handling_time());
        if !handler.is_completed() {
            log::warn!(
                "seq={}: caller gave up waiting, request left outstanding",
                handler.sequence()
            );
        }
        result
    }

    pub fn registry(&self) -> &Arc<SequenceRegistry<RequestHandler>> {
        &self.context.registry
    }

    /// Requests sent but not yet completed
    pub fn outstanding(&self) -> usize {
        self.context.registry.len()
    }

    pub fn translator_name(&self) -> &'static str {
        self.context.translator.name()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop both pumps and close the transport
    pub fn shutdown(&mut self) -> Result<()> {
        if self.receiver_handle.is_none() && self.dispatcher_handle.is_none() {
            return Ok(());
        }
        log::info!("Shutting down CIL proxy...");
        self.running.store(false, Ordering::Relaxed);
        self.context.transport.close();

        let mut panicked = false;
        if let Some(handle) = self.receiver_handle.take() {
            panicked |= handle.join().is_err();
        }
        if let Some(handle) = self.dispatcher_handle.take() {
            panicked |= handle.join().is_err();
        }

        let outstanding = self.outstanding();
        if outstanding > 0 {
            log::warn!("{} request(s) still outstanding at shutdown", outstanding);
        }
        log::info!("CIL proxy stopped");

        if panicked {
            return Err(Error::ThreadPanic);
        }
        Ok(())
    }
}

impl Drop for ProxyServer {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::codes;
    use crate::protocol::{MessageClass, decode, encode};
    use crate::proxy::testing::RecordingSession;
    use crate::transport::MockTransport;
    use std::time::{Duration, Instant};

    fn start(transport: &MockTransport, start_sequence: i32) -> ProxyServer {
        let mut config = Config::default();
        config.proxy.start_sequence = start_sequence;
        config.proxy.dispatch_poll_ms = 20;
        ProxyServer::with_transport(
            &config,
            Arc::new(transport.clone()),
            create_translator("tcs").unwrap(),
        )
        .unwrap()
    }

    fn wait_for<F: Fn() -> bool>(condition: F) {
        let deadline = Instant::now() + Duration::from_secs(2);
        while !condition() {
            assert!(Instant::now() < deadline, "condition not reached");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_ack_done_scenario() {
        let transport = MockTransport::new();
        let mut server = start(&transport, 40);
        let session = RecordingSession::new();

        let handler = server.submit(
            Command::Slew {
                ra_deg: 1.0,
                dec_deg: 2.0,
            },
            session.clone(),
        );
        assert_eq!(handler.sequence(), 41);
        assert_eq!(decode(&transport.sent()[0]).unwrap().sequence, 41);

        transport.inject(encode(1, 17, MessageClass::Ack, 1, 41, ""));
        wait_for(|| session.acks().len() == 1);
        assert_eq!(session.acks()[0].1, Duration::from_secs(10).mul_f64(1.1));

        transport.inject(encode(1, 17, MessageClass::Done, 1, 41, "OK 1.0 2.0"));
        wait_for(|| session.dones().len() == 1);
        assert!(session.dones()[0].1.success);
        assert!(!server.registry().contains(41));

        server.shutdown().unwrap();
        assert!(!server.is_running());
    }

    #[test]
    fn test_execute_blocks_until_done() {
        let transport = MockTransport::new();
        let server = start(&transport, 0);

        let responder = {
            let transport = transport.clone();
            thread::spawn(move || {
                wait_for(|| !transport.sent().is_empty());
                let cmd = decode(&transport.sent()[0]).unwrap();
                transport.inject(encode(
                    1,
                    17,
                    MessageClass::Error,
                    1,
                    cmd.sequence,
                    "<<090000>> expired",
                ));
            })
        };

        let result = server.execute(Command::Stop);
        responder.join().unwrap();
        assert!(!result.success);
        assert_eq!(result.code, codes::FAR_END_TIMEOUT);
        assert_eq!(server.outstanding(), 0);
    }

    #[test]
    fn test_transmit_failure_after_shutdown() {
        let transport = MockTransport::new();
        let mut server = start(&transport, 0);
        server.shutdown().unwrap();

        let result = server.execute(Command::Stop);
        assert_eq!(result.code, codes::TRANSMIT_FAILED);
        assert_eq!(server.outstanding(), 0);
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let transport = MockTransport::new();
        let mut server = start(&transport, 0);
        server.shutdown().unwrap();
        server.shutdown().unwrap();
    }
}
