use serde::Serialize;
use std::collections::HashMap;
use std::net::IpAddr;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

impl AuthRequest {
    /// Header value by lowercase name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Authenticated identity: the site user a request acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub user_id: u32,
    pub method: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup() {
        let mut headers = HashMap::new();
        headers.insert("x-user-id".to_string(), "12".to_string());
        let request = AuthRequest {
            headers,
            source_ip: "127.0.0.1".parse().unwrap(),
        };
        assert_eq!(request.header("x-user-id"), Some("12"));
        assert_eq!(request.header("authorization"), None);
    }

    #[test]
    fn test_identity_serialization() {
        let identity = Identity {
            user_id: 3,
            method: "api_key",
        };
        let json = serde_json::to_value(identity).unwrap();
        assert_eq!(json["user_id"], 3);
        assert_eq!(json["method"], "api_key");
    }
}
