use castlink_core::IceServerConfig;
use serde::Deserialize;

/// ICE configuration handed to every peer connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig {
                    urls: vec!["stun:stun.l.google.com:19302".to_owned()],
                    ..Default::default()
                },
                IceServerConfig {
                    urls: vec!["stun:stun1.l.google.com:19302".to_owned()],
                    ..Default::default()
                },
            ],
        }
    }
}
