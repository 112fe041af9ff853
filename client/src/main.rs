mod app;
mod entities;
mod game;
mod input;
mod network;
mod rendering;

use clap::Parser;
use log::{error, info};
use macroquad::prelude::*;
use ::rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use app::App;
use game::NoopHooks;
use input::InputSampler;
use rendering::{HudState, Renderer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3000")]
    server: String,

    /// Fixed player id (random 1000-9999 when omitted)
    #[arg(short = 'p', long)]
    player_id: Option<u32>,

    /// Game to join on registration
    #[arg(short = 'g', long)]
    game_id: Option<String>,

    /// Window width
    #[arg(short = 'w', long, default_value = "800")]
    width: usize,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "600")]
    height: usize,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Arena Shooter".to_string(),
        window_width: 800,
        window_height: 600,
        ..Default::default()
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u64
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    request_new_screen_size(args.width as f32, args.height as f32);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to start io runtime: {}", e);
            return;
        }
    };

    let player_id = args
        .player_id
        .unwrap_or_else(|| ::rand::thread_rng().gen_range(1000..=9999));

    info!("Starting client as player {}", player_id);
    info!("Connecting to: {}", args.server);
    info!("Controls: WASD/arrows to move, Space to fire, Enter to start");
    info!("Press R to reconnect, Escape to quit");

    let mut client = App::new(
        runtime.handle().clone(),
        args.server,
        player_id,
        args.game_id,
        Box::new(NoopHooks),
    );
    client.connect();

    let mut sampler = InputSampler::new();
    let mut renderer = Renderer::new(args.width, args.height);

    loop {
        let dt_ms = get_frame_time() * 1000.0;
        let now_ms = wall_clock_ms();

        let sampled = sampler.sample();
        if sampled.quit {
            break;
        }
        if sampled.reconnect {
            client.connect();
        }

        client.frame(dt_ms, sampled.direction, &sampled.actions);

        let hud = HudState {
            connected: client.session.is_connected(),
            registered: client.is_registered(),
            player_id: client.player_id(),
        };
        renderer.render(&client.world.borrow(), &client.flow.borrow(), hud, now_ms);

        next_frame().await;
    }
}
