use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};

use serde::{Deserialize, Serialize};

/// Credentials presented with a request. Header names are lowercase.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    /// Request originating from the loopback interface.
    pub fn local(headers: HashMap<String, String>) -> Self {
        Self {
            headers,
            source_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// The operator a request acts on behalf of. Recorded in audit events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            user_id: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }

    pub fn operator() -> Self {
        Self {
            user_id: "operator".to_string(),
            method: "api_key".to_string(),
        }
    }
}
