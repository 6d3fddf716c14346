// [apps/mimosa-server/src/services/ingestion/port_detector.rs]
//! The "PortDetector" honeypot (§4.9): one TCP or UDP listener per
//! configured port. Any inbound connection or datagram is, by
//! construction, an offense; the TCP side accepts and immediately
//! drops the stream, the UDP side just observes the sender of each
//! datagram.

use std::net::IpAddr;

use mimosa_models::Protocol;
use tokio::net::{TcpListener, UdpSocket};
use tracing::{error, info, warn};

use crate::state::AppState;

pub fn spawn_tcp(state: AppState, port: u16) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", port);
        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!("port_detector: failed to bind tcp {}: {}", addr, e);
                return;
            }
        };

        info!("port_detector: listening on tcp {}", addr);
        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    drop(stream);
                    let state = state.clone();
                    tokio::spawn(async move {
                        record_hit(&state, peer.ip(), port, Protocol::Tcp).await;
                    });
                }
                Err(e) => {
                    warn!("port_detector: tcp accept failed on port {}: {}", port, e);
                }
            }
        }
    })
}

pub fn spawn_udp(state: AppState, port: u16) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let addr = format!("0.0.0.0:{}", port);
        let socket = match UdpSocket::bind(&addr).await {
            Ok(socket) => socket,
            Err(e) => {
                error!("port_detector: failed to bind udp {}: {}", addr, e);
                return;
            }
        };

        info!("port_detector: listening on udp {}", addr);
        let mut buf = [0u8; 512];
        loop {
            match socket.recv_from(&mut buf).await {
                Ok((_, peer)) => {
                    let state = state.clone();
                    tokio::spawn(async move {
                        record_hit(&state, peer.ip(), port, Protocol::Udp).await;
                    });
                }
                Err(e) => {
                    warn!("port_detector: udp recv failed on port {}: {}", port, e);
                }
            }
        }
    })
}

async fn record_hit(state: &AppState, source_ip: IpAddr, port: u16, protocol: Protocol) {
    let settings = match state.settings.get_plugin_config().await {
        Ok(Some(config)) => config,
        Ok(None) => return,
        Err(e) => {
            warn!("port_detector: failed to load plugin config: {}", e);
            return;
        }
    };

    if !settings.port_detector.enabled {
        return;
    }

    let rule = settings.port_detector.rules.iter().find(|rule| rule.protocol == protocol && rule.spec.contains(port));

    let Some(rule) = rule else {
        return;
    };

    let protocol_label = match protocol {
        Protocol::Tcp => "tcp",
        Protocol::Udp => "udp",
    };
    let description = format!("honeypot connection on port {}/{}", port, protocol_label);

    let event = mimosa_models::OffenseEvent {
        source_ip,
        description,
        plugin: Some("port_detector".to_string()),
        severity: Some(rule.severity),
        host: None,
        path: None,
        context: super::submit::empty_context(),
    };

    if let Err(e) = super::submit::submit(state, event).await {
        error!("port_detector: submit failed: {}", e);
    }
}
