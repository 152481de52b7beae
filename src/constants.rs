//! # Registration Constants
//!
//! Protocol families, property keys, and path conventions shared by the
//! metadata builder, the lifecycle entry points, and configuration parsing.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Suffix appended to the context path for a whole-instance registration
pub const FULL_PATH_SUFFIX: &str = "/**";

/// Wildcard character that marks a catch-all handler path
pub const WILDCARD: char = '*';

/// Keys recognized in [`RegisterCenterConfig::props`](crate::config::RegisterCenterConfig)
pub mod props {
    pub const CONTEXT_PATH: &str = "contextPath";
    pub const APP_NAME: &str = "appName";
    pub const PORT: &str = "port";
    pub const HOST: &str = "host";
    pub const IS_FULL: &str = "isFull";
}

/// Protocol family of a registered endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RpcType {
    Http,
    SpringCloud,
    Dubbo,
    Sofa,
    Tars,
    Grpc,
    Motan,
    #[serde(rename = "websocket")]
    WebSocket,
}

impl RpcType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcType::Http => "http",
            RpcType::SpringCloud => "springCloud",
            RpcType::Dubbo => "dubbo",
            RpcType::Sofa => "sofa",
            RpcType::Tars => "tars",
            RpcType::Grpc => "grpc",
            RpcType::Motan => "motan",
            RpcType::WebSocket => "websocket",
        }
    }
}

impl fmt::Display for RpcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RpcType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(RpcType::Http),
            "springcloud" => Ok(RpcType::SpringCloud),
            "dubbo" => Ok(RpcType::Dubbo),
            "sofa" => Ok(RpcType::Sofa),
            "tars" => Ok(RpcType::Tars),
            "grpc" => Ok(RpcType::Grpc),
            "motan" => Ok(RpcType::Motan),
            "websocket" => Ok(RpcType::WebSocket),
            other => Err(format!("unknown rpc type: {other}")),
        }
    }
}
