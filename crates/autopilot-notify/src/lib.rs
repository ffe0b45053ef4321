use std::time::Duration;

use serde::Deserialize;

// ── Config ──

/// A push channel, stored in `.autopilot/config.json` under `notify_channels`.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum Channel {
    #[serde(rename = "ntfy")]
    Ntfy { url: String, events: Vec<String> },
    #[serde(rename = "webhook")]
    Webhook { url: String, events: Vec<String> },
}

impl Channel {
    fn events(&self) -> &[String] {
        match self {
            Channel::Ntfy { events, .. } | Channel::Webhook { events, .. } => events,
        }
    }

    pub fn display_name(&self) -> String {
        match self {
            Channel::Ntfy { url, .. } => format!("ntfy({url})"),
            Channel::Webhook { url, .. } => format!("webhook({url})"),
        }
    }

    fn matches(&self, event: &NotifyEvent) -> bool {
        let name = event.event_name();
        self.events().iter().any(|e| e == name || e == "*")
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct NotifyConfig {
    pub channels: Vec<Channel>,
}

impl NotifyConfig {
    /// Load from `.autopilot/config.json` key `notify_channels`.
    /// A missing file, key, or unreadable value gives no channels.
    pub fn load(paths: &autopilot_ledger::AutopilotPaths) -> Self {
        let Ok(content) = std::fs::read_to_string(&paths.config_json) else {
            return Self::default();
        };
        let Ok(val) = serde_json::from_str::<serde_json::Value>(&content) else {
            return Self::default();
        };
        let Some(channels_val) = val.get("notify_channels") else {
            return Self::default();
        };
        match serde_json::from_value::<Vec<Channel>>(channels_val.clone()) {
            Ok(channels) => Self { channels },
            Err(e) => {
                tracing::warn!(error = %e, "ignoring malformed notify_channels");
                Self::default()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}

// ── Events ──

#[derive(Debug, Clone, PartialEq)]
pub enum NotifyEvent {
    /// A repair cycle reached a terminal state.
    CycleFinished {
        label: String,
        state: String,
        rebuilt: bool,
        detail: String,
    },
    /// The git repair routine ran.
    GitRepaired { success_rate: f64 },
}

impl NotifyEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            NotifyEvent::CycleFinished { .. } => "cycle_finished",
            NotifyEvent::GitRepaired { .. } => "git_repaired",
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            NotifyEvent::CycleFinished {
                label,
                state,
                rebuilt,
                detail,
            } => serde_json::json!({
                "label": label,
                "state": state,
                "rebuilt": rebuilt,
                "detail": detail,
            }),
            NotifyEvent::GitRepaired { success_rate } => serde_json::json!({
                "success_rate": success_rate,
            }),
        }
    }
}

// ── Dispatch ──

const TIMEOUT: Duration = Duration::from_secs(5);

/// Send `event` to every channel subscribed to it. Failures are logged,
/// never propagated.
pub fn dispatch(config: &NotifyConfig, event: &NotifyEvent) {
    for channel in &config.channels {
        if !channel.matches(event) {
            continue;
        }
        let name = channel.display_name();
        match send(channel, event) {
            Ok(()) => tracing::debug!(channel = %name, event = event.event_name(), "notification sent"),
            Err(e) => tracing::warn!(channel = %name, error = %e, "notification failed"),
        }
    }
}

/// Send a test event to all channels regardless of subscription.
pub fn test_channels(config: &NotifyConfig) -> Vec<(String, Result<(), String>)> {
    let event = NotifyEvent::CycleFinished {
        label: "UnknownError".to_string(),
        state: "recorded".to_string(),
        rebuilt: false,
        detail: "autopilot notify test: notifications are working".to_string(),
    };
    config
        .channels
        .iter()
        .map(|ch| (ch.display_name(), send(ch, &event).map_err(|e| e.to_string())))
        .collect()
}

fn send(channel: &Channel, event: &NotifyEvent) -> anyhow::Result<()> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(TIMEOUT))
        .build()
        .new_agent();
    match channel {
        Channel::Ntfy { url, .. } => {
            let (title, body, priority) = format_ntfy(event);
            agent
                .post(url)
                .header("Title", &title)
                .header("Priority", priority)
                .send(&body)?;
        }
        Channel::Webhook { url, .. } => {
            agent
                .post(url)
                .header("Content-Type", "application/json")
                .send(format_webhook(event).to_string())?;
        }
    }
    Ok(())
}

fn format_ntfy(event: &NotifyEvent) -> (String, String, &'static str) {
    match event {
        NotifyEvent::CycleFinished {
            label,
            state,
            rebuilt,
            detail,
        } => {
            let title = if *rebuilt {
                format!("Repaired {label}")
            } else {
                format!("Repair stopped: {label} ({state})")
            };
            let body = if detail.is_empty() {
                format!("cycle ended in {state}")
            } else {
                detail.clone()
            };
            (title, body, if *rebuilt { "default" } else { "high" })
        }
        NotifyEvent::GitRepaired { success_rate } => (
            "Git repair finished".to_string(),
            format!("{:.0}% of repair steps succeeded", success_rate * 100.0),
            if *success_rate < 1.0 { "high" } else { "low" },
        ),
    }
}

fn format_webhook(event: &NotifyEvent) -> serde_json::Value {
    serde_json::json!({
        "event_type": event.event_name(),
        "data": event.to_json(),
    })
}
