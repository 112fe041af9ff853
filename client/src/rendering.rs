use macroquad::prelude::*;

use crate::app::GameFlow;
use crate::entities::{LocalPlayer, PowerupView, ProjectileOrientation, ProjectileView, RemotePlayer};
use crate::game::World;
use shared::{PowerupKind, PLAYER_SIZE};

#[derive(Debug, Clone, Copy)]
pub struct HudState {
    pub connected: bool,
    pub registered: bool,
    pub player_id: u32,
}

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Renderer {
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn render(&mut self, world: &World, flow: &GameFlow, hud: HudState, now_ms: u64) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        for powerup in world.powerups.values() {
            self.draw_powerup(powerup);
        }

        for projectile in world.projectiles.values() {
            self.draw_projectile(projectile);
        }

        for remote in world.remotes.values() {
            if remote.is_visible(now_ms) {
                self.draw_remote(remote);
            }
        }

        if world.local.is_visible(now_ms) {
            self.draw_local(&world.local);
        }

        self.draw_hud(world, flow, hud);
    }

    fn draw_local(&mut self, player: &LocalPlayer) {
        let half = PLAYER_SIZE / 2.0;
        draw_rectangle(player.x - half, player.y - half, PLAYER_SIZE, PLAYER_SIZE, GREEN);
        draw_rectangle_lines(
            player.x - half,
            player.y - half,
            PLAYER_SIZE,
            PLAYER_SIZE,
            2.0,
            WHITE,
        );
    }

    fn draw_remote(&mut self, player: &RemotePlayer) {
        let half = PLAYER_SIZE / 2.0;
        let color = Color::from_rgba(68, 136, 255, 255);
        draw_rectangle(player.x - half, player.y - half, PLAYER_SIZE, PLAYER_SIZE, color);
        draw_rectangle_lines(
            player.x - half,
            player.y - half,
            PLAYER_SIZE,
            PLAYER_SIZE,
            2.0,
            WHITE,
        );
    }

    fn draw_projectile(&mut self, projectile: &ProjectileView) {
        let (w, h) = match projectile.orientation() {
            ProjectileOrientation::Horizontal => (16.0, 8.0),
            ProjectileOrientation::Vertical => (8.0, 16.0),
        };
        draw_rectangle(
            projectile.x - w / 2.0,
            projectile.y - h / 2.0,
            w,
            h,
            YELLOW,
        );
    }

    fn draw_powerup(&mut self, powerup: &PowerupView) {
        let color = powerup_color(powerup.kind);
        let ring_alpha = if powerup.active { 200 } else { 75 };
        let ring = Color::from_rgba(
            (color.r * 255.0) as u8,
            (color.g * 255.0) as u8,
            (color.b * 255.0) as u8,
            ring_alpha,
        );
        draw_circle(powerup.x, powerup.y, 20.0, ring);
        draw_rectangle_ex(
            powerup.x,
            powerup.y,
            16.0,
            16.0,
            DrawRectangleParams {
                offset: vec2(0.5, 0.5),
                rotation: powerup.spin,
                color,
            },
        );
    }

    fn draw_hud(&mut self, world: &World, flow: &GameFlow, hud: HudState) {
        if !hud.connected {
            let text = "DISCONNECTED";
            let size = measure_text(text, None, 24, 1.0);
            draw_text(
                text,
                self.width / 2.0 - size.width / 2.0,
                30.0,
                24.0,
                RED,
            );
        }

        let status = if hud.registered { "registered" } else { "unregistered" };
        draw_text(
            &format!("player {} ({})", hud.player_id, status),
            10.0,
            20.0,
            16.0,
            WHITE,
        );
        draw_text(
            &format!("lives: {}", world.local.lives),
            10.0,
            38.0,
            16.0,
            WHITE,
        );
        if world.local.has_speed_boost {
            draw_text(
                &format!("boost {:.1}s", world.local.speed_boost_timer),
                10.0,
                56.0,
                16.0,
                ORANGE,
            );
        }

        if let Some(winner) = flow.game_over {
            let banner = match winner {
                Some(id) if id == hud.player_id => "YOU WIN".to_string(),
                Some(id) => format!("PLAYER {} WINS", id),
                None => "DRAW".to_string(),
            };
            let size = measure_text(&banner, None, 32, 1.0);
            draw_text(
                &banner,
                self.width / 2.0 - size.width / 2.0,
                self.height / 2.0,
                32.0,
                YELLOW,
            );
        }

        if let Some(error) = &flow.last_error {
            draw_text(error, 10.0, self.height - 12.0, 14.0, RED);
        }

        draw_text(
            &format!(
                "remotes={} projectiles={} powerups={}",
                world.remotes.len(),
                world.projectiles.len(),
                world.powerups.len()
            ),
            10.0,
            self.height - 28.0,
            14.0,
            Color::from_rgba(136, 136, 136, 255),
        );
    }
}

fn powerup_color(kind: PowerupKind) -> Color {
    match kind {
        PowerupKind::Speed => Color::from_rgba(255, 102, 0, 255),
        PowerupKind::NoCooldown => Color::from_rgba(0, 255, 0, 255),
        PowerupKind::SpreadShot => Color::from_rgba(255, 0, 255, 255),
        PowerupKind::Unknown => WHITE,
    }
}
