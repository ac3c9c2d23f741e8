//! Orbital Sandbox headless driver
//!
//! Builds a world from settings, flies a scripted route for a number of
//! frames and relays the craft position through an in-process hub alongside
//! a drifting second player. Rendering is left to whichever front end embeds
//! the library.
//!
//! Usage: `orbital-sandbox [SETTINGS.json] [--frames N] [--print-settings]`

use std::sync::mpsc;

use glam::Vec2;

use orbital_sandbox::hud::{body_indicators, speed_text, star_texts};
use orbital_sandbox::net::{ClientMessage, Delta, PeerEvent, Position, RelayClient, RelayHub};
use orbital_sandbox::sim::{TickInput, World, tick};
use orbital_sandbox::{ConfigError, Settings};

/// Frame step handed to the simulation (one 60 Hz frame)
const FRAME_DT: f32 = 1.0;

struct Args {
    settings_path: Option<String>,
    frames: u32,
    print_settings: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        settings_path: None,
        frames: 600,
        print_settings: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--frames" => match iter.next().and_then(|n| n.parse().ok()) {
                Some(n) => args.frames = n,
                None => log::warn!("--frames needs a number, keeping {}", args.frames),
            },
            "--print-settings" => args.print_settings = true,
            path => args.settings_path = Some(path.to_string()),
        }
    }
    args
}

/// Scripted flight: burn, turn, burn, coast
fn scripted_input(frame: u32) -> TickInput {
    TickInput {
        thrust: frame < 90 || (150..240).contains(&frame),
        rotate_right: (90..120).contains(&frame),
        rotate_left: (300..330).contains(&frame),
    }
}

fn run(args: Args) -> Result<(), ConfigError> {
    let settings = match &args.settings_path {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if args.print_settings {
        println!("{}", settings.to_json_pretty());
        return Ok(());
    }

    let frame_ms = 1000.0 / settings.world.ticks_per_second;
    let mut world = World::new(settings);

    let hub = RelayHub::spawn();
    let (local_tx, local_rx) = mpsc::channel();
    let (ghost_tx, ghost_rx) = mpsc::channel::<String>();
    let mut client = RelayClient::new(world.settings.net.move_throttle_ms);

    let local_id = hub.connect(local_tx);
    match local_id {
        Some(id) => client.connected(id, world.craft.position),
        None => log::warn!("Relay hub unavailable, flying offline"),
    }

    // A second player drifting around the first body
    let ghost_id = hub.connect(ghost_tx);
    if let Some(ghost) = ghost_id {
        let init = ClientMessage::InitPosition(Position::from(Vec2::new(-200.0, 400.0)));
        if let Ok(json) = init.encode() {
            hub.send(ghost, json);
        }
    }

    for frame in 0..args.frames {
        let input = scripted_input(frame);
        let report = tick(&mut world, &input, FRAME_DT);

        for contact in &report.contacts {
            log::info!(
                "Frame {}: bounced off {} at speed {:.2}",
                frame,
                world.bodies[contact.body].name,
                contact.impact_speed
            );
        }

        client.tick(frame_ms, world.craft.position);
        if let Some(id) = local_id {
            for msg in client.drain_outbound() {
                match msg.encode() {
                    Ok(json) => {
                        hub.send(id, json);
                    }
                    Err(e) => log::warn!("Not sending {:?}: {}", msg, e),
                }
            }
        }

        if let Some(ghost) = ghost_id.filter(|_| frame % 6 == 0) {
            let t = frame as f32 * 0.05;
            let step = ClientMessage::Move(Delta::from(Vec2::new(t.cos(), t.sin()) * 4.0));
            if let Ok(json) = step.encode() {
                hub.send(ghost, json);
            }
        }
        while ghost_rx.try_recv().is_ok() {}

        while let Ok(json) = local_rx.try_recv() {
            client.push_inbound_json(&json);
        }
        for event in client.drain_inbound() {
            match event {
                PeerEvent::Joined(peer) => {
                    log::info!("Peer {} visible (colour {:06x})", peer.id, peer.color)
                }
                PeerEvent::Left(id) => log::info!("Peer {} gone", id),
                PeerEvent::Moved { .. } => {}
            }
        }

        if frame % 60 == 0 {
            let (stars, checked) = star_texts(&report.stats);
            log::info!(
                "Frame {}: pos ({:.0}, {:.0}) {} | {} | {} | {} arrows | {} peers",
                frame,
                world.craft.position.x,
                world.craft.position.y,
                speed_text(world.craft.speed()),
                stars,
                checked,
                body_indicators(&world.bodies, &world.camera).len(),
                client.peer_count()
            );
        }
        log::debug!("Frame {}: {} star events", frame, report.star_events.len());
    }

    client.disconnected();
    if let Some(id) = local_id {
        hub.disconnect(id);
    }
    if let Some(ghost) = ghost_id {
        hub.disconnect(ghost);
    }
    if let Some(server) = hub.shutdown() {
        log::info!("Relay roster at exit: {} entries", server.roster().len());
    }
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Orbital Sandbox (headless) starting...");

    if let Err(e) = run(parse_args()) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
