use std::io::Write;

use bthal_client::{connect_with_config, AvProfile, ClientConfig, HalConnection};
use bthal_proto::describe_event;
use tracing::{debug, info};

use crate::error::HandlerError;

/// Mutable state shared by every handler of one console.
///
/// The connection to the HAL service is opened on first use and dropped
/// when it fails, so the next command reconnects.
pub struct Session {
    out: Box<dyn Write>,
    config: ClientConfig,
    client: Option<HalConnection>,
    av: AvProfile,
    quit: bool,
}

impl Session {
    pub fn new(out: Box<dyn Write>, config: ClientConfig) -> Self {
        Self {
            out,
            config,
            client: None,
            av: AvProfile::new(),
            quit: false,
        }
    }

    /// Session over an existing connection.
    pub fn with_client(out: Box<dyn Write>, client: HalConnection) -> Self {
        let mut session = Self::new(out, ClientConfig::default());
        session.client = Some(client);
        session
    }

    pub fn out(&mut self) -> &mut dyn Write {
        self.out.as_mut()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// The HAL connection, opened now if needed.
    pub fn client(&mut self) -> Result<&mut HalConnection, HandlerError> {
        let client = match self.client.take() {
            Some(client) => client,
            None => {
                let client = connect_with_config(&self.config)?;
                info!(endpoint = %self.config.endpoint, "connected to HAL service");
                client
            }
        };
        Ok(self.client.insert(client))
    }

    /// A2DP state together with the HAL connection.
    pub fn av_and_client(&mut self) -> Result<(&mut AvProfile, &mut HalConnection), HandlerError> {
        self.client()?;
        match self.client.as_mut() {
            Some(client) => Ok((&mut self.av, client)),
            None => Err(HandlerError::Client(bthal_client::ClientError::Disconnected(
                "no connection".to_string(),
            ))),
        }
    }

    pub fn av(&self) -> &AvProfile {
        &self.av
    }

    /// Forget the connection; the next command reconnects.
    pub fn disconnect(&mut self) {
        if self.client.take().is_some() {
            debug!("dropped HAL connection");
        }
        self.av = AvProfile::new();
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Print events queued during the last command.
    pub fn print_events(&mut self) -> std::io::Result<()> {
        let Some(client) = self.client.as_mut() else {
            return Ok(());
        };
        for event in client.take_events() {
            self.av.deliver(&event);
            writeln!(self.out, "event {}", describe_event(&event))?;
        }
        self.out.flush()
    }
}
