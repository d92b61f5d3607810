use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::message::InboundMessage;
use crate::outbound::Outbound;
use crate::triggers::TriggerRegistry;

/// Matches messages against the trigger registry and relays the reply.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<TriggerRegistry>,
    outbound: Arc<dyn Outbound>,
}

impl Dispatcher {
    pub fn new(registry: Arc<TriggerRegistry>, outbound: Arc<dyn Outbound>) -> Self {
        Self { registry, outbound }
    }

    /// Run every trigger against the message text in registry order.
    /// Each match overwrites the previous reply, so the last matching
    /// pattern wins. Triggers with an invalid pattern are skipped.
    pub fn select_response(&self, msg: &InboundMessage) -> Option<String> {
        let mut response = String::new();

        for (pattern, trigger) in self.registry.iter() {
            let regex = match &trigger.regex {
                Ok(regex) => regex,
                Err(e) => {
                    warn!("Skipping trigger {:?}: {}", pattern, e);
                    continue;
                }
            };
            if regex.is_match(&msg.text) {
                response = trigger.handler.respond(msg);
            }
        }

        if response.is_empty() {
            None
        } else {
            Some(response)
        }
    }

    /// Select a reply and send it. At most one message goes out per call.
    pub async fn dispatch(&self, msg: &InboundMessage) -> Result<Option<String>> {
        let Some(response) = self.select_response(msg) else {
            return Ok(None);
        };

        info!("Sending message: {}", response);
        self.outbound
            .send(&response)
            .await
            .context("Error when sending")?;

        Ok(Some(response))
    }
}
