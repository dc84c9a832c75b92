//! Example: two cooperative sockets trading multi-frame messages
//!
//! Run with `RUST_LOG=greenwire=trace` to watch edges and resyncs.

use greenwire::net::DatagramTransport;
use greenwire::{GreenSocket, task};
use tracing_subscriber::EnvFilter;

#[greenwire::main]
async fn main() -> greenwire::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (client, server) = DatagramTransport::pair()?;
    let client = GreenSocket::new(client)?;
    let server = GreenSocket::new(server)?;

    // Echo every message back with its frames reversed
    let echo = task::spawn(async move {
        for _ in 0..3 {
            let mut frames = server.recv_batch().await?;
            frames.reverse();
            server.send_batch(frames).await?;
        }
        Ok::<_, greenwire::SocketError>(server.stats())
    });

    for round in 0..3 {
        let greeting = format!("round {round}");
        client.send_batch(["ping", greeting.as_str()]).await?;

        let reply = client.recv_batch().await?;
        println!("{round}: {reply:?}");
    }

    let stats = echo.await?;
    println!("server: {stats:?}");
    println!("client: {:?}", client.stats());

    Ok(())
}
