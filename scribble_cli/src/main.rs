use chrono::Local;
use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use spinners::{Spinner, Spinners};
use tokio::time::{Duration, timeout};
use tokio_tungstenite::{connect_async, tungstenite::Message};

// Where the relay lives unless a url argument says otherwise.
const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:3000/ws";

/// A CLI for poking a Scribble relay from the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send one drawing segment and wait for the relay's echo.
    /// Example: scribble send --x0 0.1 --y0 0.2 --x1 0.3 --y1 0.4
    Send {
        /// Segment start, as fractions of the canvas size.
        #[arg(long)]
        x0: f64,
        #[arg(long)]
        y0: f64,
        /// Segment end, as fractions of the canvas size.
        #[arg(long)]
        x1: f64,
        #[arg(long)]
        y1: f64,
        /// CSS-style stroke color.
        #[arg(long, default_value = "#0000ff")]
        color: String,
        /// Stroke width in pixels. Left out of the payload when not given.
        #[arg(long)]
        width: Option<f64>,
        /// WebSocket URL of the relay.
        url: Option<String>,
    },
    /// Print every drawing event the relay broadcasts, as it happens.
    Tail {
        /// WebSocket URL of the relay.
        url: Option<String>,
    },
}

// The wire record, mirrored from the relay's shared types. The relay itself
// forwards payloads opaquely, so this is only a client-side convention.
#[derive(Serialize, Deserialize, Debug)]
struct DrawingMessage {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            x0,
            y0,
            x1,
            y1,
            color,
            width,
            url,
        } => {
            let url = url.unwrap_or_else(|| DEFAULT_RELAY_URL.to_string());
            let mut sp = Spinner::new(Spinners::Dots9, "Sending drawing segment...".into());

            let (mut ws, _) = connect_async(url.as_str()).await?;
            let payload = serde_json::to_string(&DrawingMessage {
                x0,
                y0,
                x1,
                y1,
                color,
                width,
            })?;
            ws.send(Message::Text(payload.into())).await?;

            // The relay echoes every segment back to its sender as well;
            // that echo doubles as delivery confirmation here.
            match timeout(Duration::from_secs(5), ws.next()).await {
                Ok(Some(Ok(msg))) if msg.is_text() => {
                    sp.stop_with_message("✓ Segment relayed!".into());
                    println!("{}", msg.into_text()?);
                }
                _ => {
                    sp.stop_with_message("✗ No echo from the relay.".into());
                    return Err("no echo received from the relay".into());
                }
            }
            ws.close(None).await.ok();
        }
        Commands::Tail { url } => {
            let url = url.unwrap_or_else(|| DEFAULT_RELAY_URL.to_string());
            let mut sp = Spinner::new(Spinners::Dots9, "Connecting to relay...".into());

            let (mut ws, _) = connect_async(url.as_str()).await?;
            sp.stop_with_message("✓ Connected. Waiting for drawing events...".into());

            while let Some(msg) = ws.next().await {
                let msg = msg?;
                if !msg.is_text() {
                    continue;
                }
                let text = msg.into_text()?;
                let stamp = Local::now().format("%H:%M:%S");
                match serde_json::from_str::<DrawingMessage>(&text) {
                    Ok(d) => println!(
                        "[{stamp}] ({:.3}, {:.3}) -> ({:.3}, {:.3})  color {}  width {}",
                        d.x0,
                        d.y0,
                        d.x1,
                        d.y1,
                        d.color,
                        d.width.map_or("-".to_string(), |w| w.to_string()),
                    ),
                    // The relay forwards anything; show unparsed payloads raw.
                    Err(_) => println!("[{stamp}] (raw) {text}"),
                }
            }
            eprintln!("Connection closed by the relay.");
        }
    }

    Ok(())
}
