//! Entity state and per-frame motion for everything the client displays.
//!
//! The local player reconciles against server authority with a three-tier
//! strategy keyed to displacement; remote players ease toward their last
//! reported position; projectiles dead-reckon from authoritative velocity.

use shared::{
    Direction, PlayerRecord, PowerupKind, PowerupRecord, ProjectileRecord, INVULN_FLASH_MS,
    PLAYER_SPEED, REMOTE_LERP_RATE, SMOOTH_MAX_MS, SMOOTH_MIN_MS, SMOOTH_THRESHOLD,
    SNAP_THRESHOLD, SPEED_BOOST_MULTIPLIER,
};

/// Strategy chosen for one authoritative position update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Correction {
    /// Displacement within the snap threshold: retarget and let the normal
    /// seek converge.
    Tracking,
    /// Displacement worth animating: timed ease-out tween to the server
    /// position.
    Smoothing { duration_ms: f32 },
    /// Displacement too large for any animation to be honest: jump.
    Teleporting,
}

/// An in-flight smoothing tween from the position displayed when the
/// correction began to the server-reported position.
#[derive(Debug, Clone)]
struct SmoothCorrection {
    from_x: f32,
    from_y: f32,
    to_x: f32,
    to_y: f32,
    elapsed_ms: f32,
    duration_ms: f32,
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

/// The locally controlled player.
///
/// Displayed position is optimistic: between snapshots it seeks the current
/// target at capped speed, and every snapshot may retarget, tween, or
/// teleport it. The displayed position is valid before any data arrives
/// because the target starts at the spawn point.
#[derive(Debug)]
pub struct LocalPlayer {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub facing: Direction,
    /// Suppresses target-seeking while an external driver owns the position.
    pub manual_control: bool,
    /// Mirrors the collision body's enabled state for the scene collaborator.
    pub body_enabled: bool,
    pub has_speed_boost: bool,
    pub speed_boost_timer: f32,
    pub lives: i32,
    pub invulnerable: bool,
    correction: Option<SmoothCorrection>,
}

impl LocalPlayer {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            target_x: x,
            target_y: y,
            vel_x: 0.0,
            vel_y: 0.0,
            facing: Direction::Up,
            manual_control: false,
            body_enabled: true,
            has_speed_boost: false,
            speed_boost_timer: 0.0,
            lives: shared::DEFAULT_LIVES,
            invulnerable: false,
            correction: None,
        }
    }

    /// Applies one authoritative server record.
    ///
    /// Any in-flight smoothing tween is cancelled first, leaving the
    /// displayed position where it currently is, so the new strategy is
    /// always evaluated against what is actually on screen. Lives,
    /// invulnerability and speed boost are copied regardless of which
    /// position strategy is chosen.
    pub fn apply_server_record(&mut self, record: &PlayerRecord) -> Correction {
        self.cancel_correction();

        let dx = record.x - self.x;
        let dy = record.y - self.y;
        let distance = (dx * dx + dy * dy).sqrt();

        let strategy = if distance <= SNAP_THRESHOLD {
            self.target_x = record.x;
            self.target_y = record.y;
            Correction::Tracking
        } else if distance <= SMOOTH_THRESHOLD {
            let duration_ms = (distance * 2.0).floor().clamp(SMOOTH_MIN_MS, SMOOTH_MAX_MS);
            self.begin_correction(record.x, record.y, duration_ms);
            Correction::Smoothing { duration_ms }
        } else {
            self.x = record.x;
            self.y = record.y;
            self.target_x = record.x;
            self.target_y = record.y;
            self.vel_x = 0.0;
            self.vel_y = 0.0;
            Correction::Teleporting
        };

        self.has_speed_boost = record.has_speed_boost;
        self.speed_boost_timer = record.speed_boost_timer;
        self.lives = record.lives;
        self.invulnerable = record.invulnerable_time > 0.0;

        strategy
    }

    fn begin_correction(&mut self, to_x: f32, to_y: f32, duration_ms: f32) {
        self.vel_x = 0.0;
        self.vel_y = 0.0;
        self.body_enabled = false;
        self.manual_control = true;
        self.correction = Some(SmoothCorrection {
            from_x: self.x,
            from_y: self.y,
            to_x,
            to_y,
            elapsed_ms: 0.0,
            duration_ms,
        });
    }

    /// Drops an in-flight tween without completing it. The displayed
    /// position stays where the tween left it; the body comes back at that
    /// point with zero velocity.
    fn cancel_correction(&mut self) {
        if self.correction.take().is_some() {
            self.vel_x = 0.0;
            self.vel_y = 0.0;
            self.body_enabled = true;
            self.manual_control = false;
        }
    }

    pub fn correction_active(&self) -> bool {
        self.correction.is_some()
    }

    /// Advances one frame: an active tween if there is one, otherwise the
    /// velocity-seeking approach toward the current target.
    pub fn update(&mut self, dt_ms: f32) {
        if let Some(c) = &mut self.correction {
            c.elapsed_ms += dt_ms;
            if c.elapsed_ms >= c.duration_ms {
                let (to_x, to_y) = (c.to_x, c.to_y);
                self.x = to_x;
                self.y = to_y;
                self.target_x = to_x;
                self.target_y = to_y;
                self.vel_x = 0.0;
                self.vel_y = 0.0;
                self.body_enabled = true;
                self.manual_control = false;
                self.correction = None;
            } else {
                let t = ease_out_cubic(c.elapsed_ms / c.duration_ms);
                self.x = c.from_x + (c.to_x - c.from_x) * t;
                self.y = c.from_y + (c.to_y - c.from_y) * t;
            }
            return;
        }

        if self.manual_control {
            return;
        }

        if self.speed_boost_timer > 0.0 {
            self.speed_boost_timer = (self.speed_boost_timer - dt_ms / 1000.0).max(0.0);
        }

        let dx = self.target_x - self.x;
        let dy = self.target_y - self.y;
        let distance = (dx * dx + dy * dy).sqrt();
        if distance <= f32::EPSILON {
            self.vel_x = 0.0;
            self.vel_y = 0.0;
            return;
        }

        let speed = if self.has_speed_boost {
            PLAYER_SPEED * SPEED_BOOST_MULTIPLIER
        } else {
            PLAYER_SPEED
        };
        let step = speed * dt_ms / 1000.0;
        if step >= distance {
            self.x = self.target_x;
            self.y = self.target_y;
            self.vel_x = 0.0;
            self.vel_y = 0.0;
        } else {
            self.vel_x = dx / distance * speed;
            self.vel_y = dy / distance * speed;
            self.x += self.vel_x * dt_ms / 1000.0;
            self.y += self.vel_y * dt_ms / 1000.0;
        }
    }

    /// Called by the collision collaborator when the body is pushed into a
    /// wall: retargeting to the displayed position stops the seek from
    /// jittering against the obstacle.
    pub fn on_blocked(&mut self) {
        self.target_x = self.x;
        self.target_y = self.y;
    }

    pub fn update_facing(&mut self, direction: Direction) {
        self.facing = direction;
    }

    /// Flash phase while invulnerable, keyed to wall-clock milliseconds so
    /// the rate does not depend on frame rate.
    pub fn is_visible(&self, now_ms: u64) -> bool {
        !self.invulnerable || (now_ms / INVULN_FLASH_MS) % 2 == 0
    }
}

/// Another player, displayed by easing toward its last reported position.
#[derive(Debug)]
pub struct RemotePlayer {
    pub x: f32,
    pub y: f32,
    pub target_x: f32,
    pub target_y: f32,
    pub has_speed_boost: bool,
    pub speed_boost_timer: f32,
    pub lives: i32,
    pub invulnerable: bool,
}

impl RemotePlayer {
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            target_x: x,
            target_y: y,
            has_speed_boost: false,
            speed_boost_timer: 0.0,
            lives: shared::DEFAULT_LIVES,
            invulnerable: false,
        }
    }

    pub fn apply_server_record(&mut self, record: &PlayerRecord) {
        self.target_x = record.x;
        self.target_y = record.y;
        self.has_speed_boost = record.has_speed_boost;
        self.speed_boost_timer = record.speed_boost_timer;
        self.lives = record.lives;
        self.invulnerable = record.invulnerable_time > 0.0;
    }

    /// Consumes a constant fraction of the remaining distance per unit
    /// time, whatever the size of the jump. Remote entities have no local
    /// input to protect, so pure smoothing is acceptable at any distance.
    pub fn update(&mut self, dt_ms: f32) {
        let t = (REMOTE_LERP_RATE * dt_ms / 1000.0).min(1.0);
        self.x += (self.target_x - self.x) * t;
        self.y += (self.target_y - self.y) * t;
    }

    pub fn is_visible(&self, now_ms: u64) -> bool {
        !self.invulnerable || (now_ms / INVULN_FLASH_MS) % 2 == 0
    }
}

/// Sprite aspect of a projectile, derived from its dominant velocity axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectileOrientation {
    Horizontal,
    Vertical,
}

/// A server-simulated projectile. Moves too fast for easing to look right,
/// so between snapshots it advances by linear dead-reckoning.
#[derive(Debug)]
pub struct ProjectileView {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
}

impl ProjectileView {
    pub fn from_record(record: &ProjectileRecord) -> Self {
        Self {
            x: record.x,
            y: record.y,
            vx: record.vx,
            vy: record.vy,
        }
    }

    /// Snapshot updates overwrite position and velocity directly.
    pub fn apply_server_record(&mut self, record: &ProjectileRecord) {
        self.x = record.x;
        self.y = record.y;
        self.vx = record.vx;
        self.vy = record.vy;
    }

    pub fn update(&mut self, dt_ms: f32) {
        self.x += self.vx * dt_ms / 1000.0;
        self.y += self.vy * dt_ms / 1000.0;
    }

    pub fn orientation(&self) -> ProjectileOrientation {
        if self.vx.abs() > self.vy.abs() {
            ProjectileOrientation::Horizontal
        } else {
            ProjectileOrientation::Vertical
        }
    }
}

/// A pickup marker. Inactive powerups are dimmed, not destroyed.
#[derive(Debug)]
pub struct PowerupView {
    pub x: f32,
    pub y: f32,
    pub kind: PowerupKind,
    pub active: bool,
    /// Icon spin in radians, purely cosmetic.
    pub spin: f32,
}

impl PowerupView {
    pub fn from_record(record: &PowerupRecord) -> Self {
        Self {
            x: record.x,
            y: record.y,
            kind: record.kind,
            active: record.active,
            spin: 0.0,
        }
    }

    pub fn apply_server_record(&mut self, record: &PowerupRecord) {
        self.x = record.x;
        self.y = record.y;
        self.kind = record.kind;
        self.active = record.active;
    }

    pub fn update(&mut self, dt_ms: f32) {
        self.spin += dt_ms / 1000.0 * std::f32::consts::PI;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_tracking_within_snap_threshold() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        let record = PlayerRecord::new(1, 104.0, 100.0);

        let strategy = player.apply_server_record(&record);

        assert_eq!(strategy, Correction::Tracking);
        assert_eq!(player.target_x, 104.0);
        assert_eq!(player.target_y, 100.0);
        assert!(!player.correction_active());
        assert_eq!(player.x, 100.0);
    }

    #[test]
    fn test_tracking_at_exact_snap_threshold() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        let record = PlayerRecord::new(1, 108.0, 100.0);

        assert_eq!(player.apply_server_record(&record), Correction::Tracking);
    }

    #[test]
    fn test_smoothing_duration_formula() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        let record = PlayerRecord::new(1, 150.0, 100.0);

        let strategy = player.apply_server_record(&record);

        assert_eq!(strategy, Correction::Smoothing { duration_ms: 100.0 });
        assert!(player.correction_active());
        assert!(player.manual_control);
        assert!(!player.body_enabled);
        assert_eq!(player.vel_x, 0.0);
    }

    #[test]
    fn test_smoothing_duration_clamps() {
        // distance 10 -> 20ms raw, clamped up to 80
        let mut player = LocalPlayer::new(100.0, 100.0);
        let strategy = player.apply_server_record(&PlayerRecord::new(1, 110.0, 100.0));
        assert_eq!(strategy, Correction::Smoothing { duration_ms: 80.0 });

        // distance 190 -> 380ms raw, clamped down to 300
        let mut player = LocalPlayer::new(100.0, 100.0);
        let strategy = player.apply_server_record(&PlayerRecord::new(1, 290.0, 100.0));
        assert_eq!(strategy, Correction::Smoothing { duration_ms: 300.0 });
    }

    #[test]
    fn test_smoothing_at_exact_smooth_threshold() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        let strategy = player.apply_server_record(&PlayerRecord::new(1, 300.0, 100.0));
        assert_eq!(strategy, Correction::Smoothing { duration_ms: 300.0 });
    }

    #[test]
    fn test_smoothing_completes_pinned_to_server_position() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        player.apply_server_record(&PlayerRecord::new(1, 150.0, 100.0));

        player.update(50.0);
        assert!(player.x > 100.0);
        assert!(player.x < 150.0);
        assert!(!player.body_enabled);

        player.update(60.0);
        assert_eq!(player.x, 150.0);
        assert_eq!(player.y, 100.0);
        assert_eq!(player.target_x, 150.0);
        assert_eq!(player.vel_x, 0.0);
        assert!(player.body_enabled);
        assert!(!player.manual_control);
        assert!(!player.correction_active());
    }

    #[test]
    fn test_smoothing_eases_out() {
        let mut player = LocalPlayer::new(0.0, 0.0);
        player.apply_server_record(&PlayerRecord::new(1, 100.0, 0.0));
        let duration = 200.0;

        player.update(duration / 2.0);
        let first_half = player.x;
        // ease-out covers most of the distance in the first half
        assert!(first_half > 50.0);
    }

    #[test]
    fn test_teleport_beyond_smooth_threshold() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        player.vel_x = 150.0;

        let strategy = player.apply_server_record(&PlayerRecord::new(1, 500.0, 100.0));

        assert_eq!(strategy, Correction::Teleporting);
        assert_eq!(player.x, 500.0);
        assert_eq!(player.y, 100.0);
        assert_eq!(player.vel_x, 0.0);
        assert!(!player.correction_active());
        assert!(player.body_enabled);
    }

    #[test]
    fn test_new_snapshot_cancels_inflight_tween() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        player.apply_server_record(&PlayerRecord::new(1, 150.0, 100.0));
        player.update(30.0);
        let displayed = player.x;
        assert!(displayed > 100.0);

        // a second smoothing restarts from the currently displayed position
        player.apply_server_record(&PlayerRecord::new(1, 120.0, 100.0));
        assert!(player.correction_active());
        assert_approx_eq!(player.x, displayed, 1e-5);

        // and a tracking snapshot drops the tween entirely
        let near = PlayerRecord::new(1, player.x + 1.0, 100.0);
        let strategy = player.apply_server_record(&near);
        assert_eq!(strategy, Correction::Tracking);
        assert!(!player.correction_active());
        assert!(player.body_enabled);
        assert!(!player.manual_control);
    }

    #[test]
    fn test_side_effects_copied_under_tracking() {
        let mut player = LocalPlayer::new(100.0, 100.0);
        let mut record = PlayerRecord::new(1, 102.0, 100.0);
        record.has_speed_boost = true;
        record.speed_boost_timer = 2.5;
        record.lives = 1;
        record.invulnerable_time = 1.25;

        assert_eq!(player.apply_server_record(&record), Correction::Tracking);
        assert!(player.has_speed_boost);
        assert_eq!(player.speed_boost_timer, 2.5);
        assert_eq!(player.lives, 1);
        assert!(player.invulnerable);
    }

    #[test]
    fn test_seek_moves_toward_target_without_overshoot() {
        let mut player = LocalPlayer::new(0.0, 0.0);
        player.target_x = 10.0;
        player.target_y = 0.0;

        // 16ms at 200 px/s is 3.2 px
        player.update(16.0);
        assert_approx_eq!(player.x, 3.2, 1e-3);
        assert_approx_eq!(player.vel_x, 200.0, 1e-3);

        // a long frame lands exactly on the target
        player.update(1000.0);
        assert_eq!(player.x, 10.0);
        assert_eq!(player.vel_x, 0.0);
    }

    #[test]
    fn test_seek_speed_boost_multiplier() {
        let mut player = LocalPlayer::new(0.0, 0.0);
        player.target_x = 100.0;
        player.has_speed_boost = true;

        player.update(16.0);
        assert_approx_eq!(player.x, 4.8, 1e-3);
    }

    #[test]
    fn test_on_blocked_resets_target() {
        let mut player = LocalPlayer::new(40.0, 50.0);
        player.target_x = 90.0;
        player.target_y = 50.0;

        player.on_blocked();
        assert_eq!(player.target_x, 40.0);
        assert_eq!(player.target_y, 50.0);

        let before = player.x;
        player.update(16.0);
        assert_eq!(player.x, before);
    }

    #[test]
    fn test_invulnerability_flash_is_wall_clock_keyed() {
        let mut player = LocalPlayer::new(0.0, 0.0);
        player.invulnerable = true;

        assert!(player.is_visible(0));
        assert!(player.is_visible(99));
        assert!(!player.is_visible(100));
        assert!(!player.is_visible(199));
        assert!(player.is_visible(200));

        player.invulnerable = false;
        assert!(player.is_visible(150));
    }

    #[test]
    fn test_remote_lerp_fixed_convergence_rate() {
        let mut remote = RemotePlayer::new(0.0, 0.0);
        remote.target_x = 100.0;

        // 50ms at rate 10/s covers half the remaining distance
        remote.update(50.0);
        assert_approx_eq!(remote.x, 50.0, 1e-3);
        remote.update(50.0);
        assert_approx_eq!(remote.x, 75.0, 1e-3);

        // the fraction is capped at the full remaining distance
        remote.update(500.0);
        assert_eq!(remote.x, 100.0);
    }

    #[test]
    fn test_remote_large_jump_still_eases() {
        let mut remote = RemotePlayer::new(0.0, 0.0);
        remote.apply_server_record(&PlayerRecord::new(2, 1000.0, 0.0));
        assert_eq!(remote.x, 0.0);
        remote.update(16.0);
        assert!(remote.x > 0.0);
        assert!(remote.x < 1000.0);
    }

    #[test]
    fn test_projectile_dead_reckoning() {
        let record = ProjectileRecord {
            id: 1,
            x: 10.0,
            y: 20.0,
            vx: 400.0,
            vy: -100.0,
        };
        let mut projectile = ProjectileView::from_record(&record);

        projectile.update(100.0);
        assert_approx_eq!(projectile.x, 50.0, 1e-3);
        assert_approx_eq!(projectile.y, 10.0, 1e-3);

        // snapshot overwrites, no easing
        projectile.apply_server_record(&ProjectileRecord {
            id: 1,
            x: 200.0,
            y: 0.0,
            vx: 0.0,
            vy: 300.0,
        });
        assert_eq!(projectile.x, 200.0);
        assert_eq!(projectile.vy, 300.0);
    }

    #[test]
    fn test_projectile_orientation_follows_dominant_axis() {
        let horizontal = ProjectileView {
            x: 0.0,
            y: 0.0,
            vx: -400.0,
            vy: 10.0,
        };
        assert_eq!(horizontal.orientation(), ProjectileOrientation::Horizontal);

        let vertical = ProjectileView {
            x: 0.0,
            y: 0.0,
            vx: 10.0,
            vy: 400.0,
        };
        assert_eq!(vertical.orientation(), ProjectileOrientation::Vertical);
    }

    #[test]
    fn test_inactive_powerup_is_dimmed_not_dropped() {
        let mut powerup = PowerupView::from_record(&PowerupRecord {
            id: 1,
            x: 10.0,
            y: 10.0,
            kind: PowerupKind::Speed,
            active: true,
        });
        powerup.apply_server_record(&PowerupRecord {
            id: 1,
            x: 10.0,
            y: 10.0,
            kind: PowerupKind::Speed,
            active: false,
        });
        assert!(!powerup.active);
        assert_eq!(powerup.kind, PowerupKind::Speed);
    }
}
