// * Registration request and response types

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tracing::warn;

use crate::registry::{AlertRule, ScrapeTarget};

// * Wire parameter names
pub const PARAM_SERVICE_NAME: &str = "serviceName";
pub const PARAM_SCRAPE_PORT: &str = "scrapePort";
pub const PARAM_ALERT_NAME: &str = "alertName";
pub const PARAM_ALERT_IF: &str = "alertIf";
pub const PARAM_ALERT_FROM: &str = "alertFrom";

/// Target half of a registration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetRegistration {
    pub name: String,
    pub port: u16,
}

/// Alert half of a registration; `name` is normalized by the registry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleRegistration {
    pub name: String,
    pub condition: String,
    pub source: String,
}

/// A parsed registration: either half, both, or neither may be present
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub target: Option<TargetRegistration>,
    pub rule: Option<RuleRegistration>,
}

impl RegistrationRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, name: impl Into<String>, port: u16) -> Self {
        self.target = Some(TargetRegistration {
            name: name.into(),
            port,
        });
        self
    }

    pub fn with_rule(
        mut self,
        name: impl Into<String>,
        condition: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        self.rule = Some(RuleRegistration {
            name: name.into(),
            condition: condition.into(),
            source: source.into(),
        });
        self
    }

    /// Parses a urlencoded query string or form body
    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(url::form_urlencoded::parse(query.as_bytes()))
    }

    /// Builds a request from decoded key/value pairs; later keys win.
    ///
    /// A missing or malformed `scrapePort` becomes port 0.
    pub fn from_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (Cow<'a, str>, Cow<'a, str>)>,
    {
        let mut service_name = None;
        let mut scrape_port = None;
        let mut alert_name = None;
        let mut alert_if = None;
        let mut alert_from = None;

        for (key, value) in pairs {
            let slot = match key.as_ref() {
                PARAM_SERVICE_NAME => &mut service_name,
                PARAM_SCRAPE_PORT => &mut scrape_port,
                PARAM_ALERT_NAME => &mut alert_name,
                PARAM_ALERT_IF => &mut alert_if,
                PARAM_ALERT_FROM => &mut alert_from,
                _ => continue,
            };
            *slot = Some(value.into_owned());
        }

        let target = if service_name.is_some() || scrape_port.is_some() {
            Some(TargetRegistration {
                name: service_name.unwrap_or_default(),
                port: parse_port(scrape_port.as_deref()),
            })
        } else {
            None
        };

        let rule = if alert_name.is_some() || alert_if.is_some() || alert_from.is_some() {
            Some(RuleRegistration {
                name: alert_name.unwrap_or_default(),
                condition: alert_if.unwrap_or_default(),
                source: alert_from.unwrap_or_default(),
            })
        } else {
            None
        };

        Self { target, rule }
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_none() && self.rule.is_none()
    }
}

fn parse_port(raw: Option<&str>) -> u16 {
    match raw {
        None => 0,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(scrape_port = value, "Ignoring malformed scrape port");
            0
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Nok,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Nok => "NOK",
        }
    }
}

/// JSON body returned for every registration
///
/// `target` and `rule` echo what was stored, or zero values when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationResponse {
    pub status: Status,
    pub target: ScrapeTarget,
    pub rule: AlertRule,
}
