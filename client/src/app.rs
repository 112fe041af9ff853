//! Wires the transport session to the world registry and runs the
//! per-frame step: poll the session, report input upstream, advance
//! every displayed entity.
//!
//! Registration is a small state machine driven by connection
//! transitions instead of a timer: every time the connection opens, a
//! `register` goes out, and the registered flag drops on every close so
//! a reconnect repeats the handshake before the server resumes
//! snapshots for our id.

use log::{info, warn};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::game::{World, WorldHooks};
use crate::network::Session;
use shared::{ClientMessage, Direction, InputAction, MessageKind, ServerMessage};

/// Where the local player is displayed before the first snapshot.
pub const SPAWN_X: f32 = 400.0;
pub const SPAWN_Y: f32 = 300.0;

const PING_INTERVAL_MS: f32 = 5000.0;

/// Match phase and the latest server-reported notices, for the HUD.
#[derive(Debug, Default)]
pub struct GameFlow {
    pub last_error: Option<String>,
    /// Set when the server declares the match over; `None` inside means a
    /// draw. Cleared by the next `game_start`.
    pub game_over: Option<Option<u32>>,
    pub map: Option<String>,
}

/// The client application: session, world, and game flow state.
pub struct App {
    pub session: Session,
    pub world: Rc<RefCell<World>>,
    pub flow: Rc<RefCell<GameFlow>>,
    registered: Rc<Cell<bool>>,
    player_id: u32,
    game_id: Option<String>,
    server_addr: String,
    ping_accum_ms: f32,
}

impl App {
    pub fn new(
        runtime: tokio::runtime::Handle,
        server_addr: String,
        player_id: u32,
        game_id: Option<String>,
        hooks: Box<dyn WorldHooks>,
    ) -> Self {
        let mut session = Session::new(runtime);
        let world = Rc::new(RefCell::new(World::new(player_id, SPAWN_X, SPAWN_Y)));
        let flow = Rc::new(RefCell::new(GameFlow::default()));
        let registered = Rc::new(Cell::new(false));
        let hooks = Rc::new(RefCell::new(hooks));

        {
            let world = world.clone();
            let hooks = hooks.clone();
            session.subscribe(
                MessageKind::State,
                Box::new(move |msg| {
                    if let ServerMessage::State {
                        players,
                        projectiles,
                        powerups,
                    } = msg
                    {
                        let mut hooks = hooks.borrow_mut();
                        world.borrow_mut().apply_snapshot(
                            players,
                            projectiles,
                            powerups,
                            hooks.as_mut(),
                        );
                    }
                }),
            );
        }

        {
            let registered = registered.clone();
            session.subscribe(
                MessageKind::Registered,
                Box::new(move |msg| {
                    if let ServerMessage::Registered { player_id: id } = msg {
                        info!("registered as player {}", id);
                        registered.set(true);
                    }
                }),
            );
        }

        {
            let world = world.clone();
            let flow = flow.clone();
            let hooks = hooks.clone();
            session.subscribe(
                MessageKind::GameStart,
                Box::new(move |msg| {
                    if let ServerMessage::GameStart { map } = msg {
                        info!("game start (map: {:?})", map);
                        let mut flow = flow.borrow_mut();
                        flow.game_over = None;
                        flow.map = map.clone();
                        let mut hooks = hooks.borrow_mut();
                        world.borrow_mut().reset(hooks.as_mut());
                    }
                }),
            );
        }

        {
            let flow = flow.clone();
            session.subscribe(
                MessageKind::GameOver,
                Box::new(move |msg| {
                    if let ServerMessage::GameOver { winner } = msg {
                        info!("game over, winner: {:?}", winner);
                        flow.borrow_mut().game_over = Some(*winner);
                    }
                }),
            );
        }

        {
            let flow = flow.clone();
            session.subscribe(
                MessageKind::Error,
                Box::new(move |msg| {
                    if let ServerMessage::Error { message } = msg {
                        warn!("server error: {}", message);
                        flow.borrow_mut().last_error = Some(message.clone());
                    }
                }),
            );
        }

        {
            let registered = registered.clone();
            session.on_connection_change(Box::new(move |connected| {
                if !connected {
                    // force a fresh handshake on the next connection
                    registered.set(false);
                }
            }));
        }

        Self {
            session,
            world,
            flow,
            registered,
            player_id,
            game_id,
            server_addr,
            ping_accum_ms: 0.0,
        }
    }

    pub fn connect(&mut self) {
        self.session.connect(&self.server_addr);
    }

    pub fn is_registered(&self) -> bool {
        self.registered.get()
    }

    pub fn player_id(&self) -> u32 {
        self.player_id
    }

    /// One frame of client logic: pump the session (snapshots apply here,
    /// in arrival order, before the world steps), re-register on open
    /// transitions, report input upstream, advance all entities.
    pub fn frame(&mut self, dt_ms: f32, direction: Option<Direction>, actions: &[InputAction]) {
        for opened in self.session.poll() {
            if opened && !self.registered.get() {
                self.send_register();
            }
        }

        if let Some(direction) = direction {
            self.world.borrow_mut().local.update_facing(direction);
        }

        for action in actions {
            self.session.send(&ClientMessage::Input {
                player_id: self.player_id,
                action: *action,
                payload: None,
            });
        }

        self.ping_accum_ms += dt_ms;
        if self.session.is_connected() && self.ping_accum_ms >= PING_INTERVAL_MS {
            self.session.send(&ClientMessage::Ping);
            self.ping_accum_ms = 0.0;
        }

        self.world.borrow_mut().update(dt_ms);
    }

    fn send_register(&mut self) {
        self.session.send(&ClientMessage::Register {
            player_id: self.player_id,
            game_id: self.game_id.clone(),
        });
    }
}
