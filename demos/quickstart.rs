//! Connect to a broker over WebSocket, subscribe to a queue, and echo
//! messages.
//!
//! Expects a STOMP-over-WebSocket endpoint, e.g. RabbitMQ Web-STOMP on
//! localhost:15674 (`rabbitmq-plugins enable rabbitmq_web_stomp`).

use std::time::Duration;

use cobalt_stomp::ws::{self, WsTransport};
use cobalt_stomp::{AckDecision, AckMode, ConnectionState, StompClient, StompConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = StompConfig::new("127.0.0.1", 15674, "/ws").login("guest");
    let (transport, outbound) = WsTransport::channel();
    let mut client = StompClient::new(transport, config);

    client.on_connect(|frame| {
        println!("connected, session={}", frame.header_value("session"));
    });
    client.on_error(|frame| {
        eprintln!("broker error: {}", frame.body);
    });
    client.on_disconnect(|_| {
        println!("session closed");
    });

    let mut subscribed = false;
    ws::drive(
        &mut client,
        outbound,
        Duration::from_millis(250),
        move |client| {
            if client.state() == ConnectionState::Connected && !subscribed {
                subscribed = true;
                let _ = client.subscribe("/queue/demo", AckMode::Client, |message| {
                    println!("message: {}", message.body);
                    AckDecision::Ack
                });
            }
        },
    )
    .await?;

    Ok(())
}
