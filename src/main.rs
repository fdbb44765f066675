//! RoadGlass bridge host.
//!
//! Speaks the shell's request/response channel over stdio: one JSON
//! request per line in, one JSON response per line out.
//!
//! Usage:
//!   roadglass-bridge                      Camera preview starts empty
//!   roadglass-bridge --feed <image>       Preview shows a still image
//!
//! Request:  {"channel":"app.gallery_saver","method":"saveImage","arguments":{"path":"/tmp/a.png"}}
//! Response: {"status":"success","result":{"success":true,"mediaHandleRef":"media://images/1","path":"/tmp/a.png"}}

use roadglass_bridge_lib::capture::FrameSlot;
use roadglass_bridge_lib::view::{ViewNode, Window};
use roadglass_bridge_lib::{bridge_from_config, BridgeConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let feed = match parse_feed(&args) {
        Ok(feed) => feed,
        Err(usage) => {
            eprintln!("{}", usage);
            std::process::exit(2);
        }
    };

    // The shell's UI context: one cooperative thread. Blocking work
    // (copies, file I/O) goes to the blocking pool.
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(serve(feed)) {
        log::error!("Bridge stopped: {}", e);
        std::process::exit(1);
    }
}

fn parse_feed(args: &[String]) -> Result<Option<PathBuf>, String> {
    match args.iter().position(|a| a == "--feed") {
        None => Ok(None),
        Some(i) => args
            .get(i + 1)
            .map(|p| Some(PathBuf::from(p)))
            .ok_or_else(|| "Usage: roadglass-bridge [--feed <image>]".to_string()),
    }
}

async fn serve(feed: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = BridgeConfig::from_env();

    let preview = Arc::new(FrameSlot::new(0, 0));
    if let Some(path) = feed {
        let frame = image::open(&path)?.to_rgba8();
        preview.resize(frame.width(), frame.height());
        preview.publish(frame);
        log::info!("Preview fed from {}", path.display());
    }

    let window = Arc::new(Window::new(ViewNode::container(
        "decor",
        vec![
            ViewNode::surface("camera-preview", preview.clone()),
            ViewNode::widget("detection-overlay"),
        ],
    )));
    let bridge = bridge_from_config(&config, window)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let reply = bridge.handle_json(&line).await;
        stdout.write_all(reply.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    log::info!("Input closed — shutting down");
    Ok(())
}
