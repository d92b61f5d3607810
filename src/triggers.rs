use std::collections::BTreeMap;
use std::sync::Arc;

use regex::Regex;
use tracing::info;

use crate::message::InboundMessage;

/// Produces a reply for a message whose text matched a trigger.
/// An empty string means "no reply".
pub trait Handler: Send + Sync {
    fn respond(&self, msg: &InboundMessage) -> String;
}

impl<F> Handler for F
where
    F: Fn(&InboundMessage) -> String + Send + Sync,
{
    fn respond(&self, msg: &InboundMessage) -> String {
        self(msg)
    }
}

/// A registered pattern and its handler.
pub struct Trigger {
    /// Compile errors are kept and reported when the trigger is evaluated.
    pub regex: Result<Regex, regex::Error>,
    pub handler: Arc<dyn Handler>,
}

/// Pattern → handler map, iterated in lexicographic pattern order.
#[derive(Default)]
pub struct TriggerRegistry {
    triggers: BTreeMap<String, Trigger>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store the handler for `pattern`, replacing any previous one.
    pub fn register<H>(&mut self, pattern: impl Into<String>, handler: H)
    where
        H: Handler + 'static,
    {
        let pattern = pattern.into();
        let trigger = Trigger {
            regex: Regex::new(&pattern),
            handler: Arc::new(handler),
        };
        if self.triggers.insert(pattern.clone(), trigger).is_some() {
            info!("Replaced trigger: {}", pattern);
        } else {
            info!("Registered trigger: {}", pattern);
        }
    }

    /// Register a fixed reply. `{name}` and `{text}` in the template are
    /// filled from the inbound message.
    pub fn register_reply(&mut self, pattern: impl Into<String>, template: impl Into<String>) {
        let template = template.into();
        self.register(pattern, move |msg: &InboundMessage| {
            template
                .replace("{name}", &msg.name)
                .replace("{text}", &msg.text)
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Trigger)> {
        self.triggers.iter().map(|(p, t)| (p.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
