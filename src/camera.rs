//! Orbit camera and the animated fly-to-home transition.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy_egui::EguiContexts;

use crate::config::AppConfig;
use crate::geo::LocalFrame;

const MIN_PITCH: f32 = 5.0;
const MAX_PITCH: f32 = 89.0;
const MIN_DISTANCE: f32 = 300.0;
const MAX_DISTANCE: f32 = 400_000.0;
const ORBIT_SENSITIVITY: f32 = 0.3;
const PAN_SENSITIVITY: f32 = 0.0015;
const ZOOM_STEP: f32 = 0.1;
/// Overview the startup flight begins from, as a multiple of the home range
const OVERVIEW_RANGE_FACTOR: f32 = 6.0;
const CAMERA_FAR: f32 = 2_000_000.0;

/// Marker for the scene camera
#[derive(Component)]
pub struct MainCamera;

/// Request an animated flight back to the home view
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct FlyToHome;

/// Camera pose as an orbit around a focus point (Y-up scene coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitView {
    pub focus: Vec3,
    /// Heading of the view direction, degrees clockwise from north
    pub yaw_deg: f32,
    /// Elevation angle above the horizon, degrees
    pub pitch_deg: f32,
    pub distance: f32,
}

impl OrbitView {
    /// Camera transform. At yaw 0 the camera sits south of the focus looking north.
    pub fn transform(&self) -> Transform {
        let pitch = self.pitch_deg.to_radians();
        let yaw = self.yaw_deg.to_radians();
        let horizontal = self.distance * pitch.cos();
        let vertical = self.distance * pitch.sin();
        let position = Vec3::new(
            self.focus.x - horizontal * yaw.sin(),
            self.focus.y + vertical,
            self.focus.z + horizontal * yaw.cos(),
        );
        Transform::from_translation(position).looking_at(self.focus, Vec3::Y)
    }

    /// Ground-plane forward and right unit vectors for the current yaw
    fn ground_basis(&self) -> (Vec3, Vec3) {
        let yaw = self.yaw_deg.to_radians();
        let forward = Vec3::new(yaw.sin(), 0.0, -yaw.cos());
        let right = Vec3::new(yaw.cos(), 0.0, yaw.sin());
        (forward, right)
    }

    /// Interpolate towards `to`, turning the short way round in yaw
    pub fn lerp(&self, to: &OrbitView, t: f32) -> OrbitView {
        let mut yaw_delta = (to.yaw_deg - self.yaw_deg).rem_euclid(360.0);
        if yaw_delta > 180.0 {
            yaw_delta -= 360.0;
        }
        OrbitView {
            focus: self.focus.lerp(to.focus, t),
            yaw_deg: (self.yaw_deg + yaw_delta * t).rem_euclid(360.0),
            pitch_deg: self.pitch_deg + (to.pitch_deg - self.pitch_deg) * t,
            distance: self.distance + (to.distance - self.distance) * t,
        }
    }
}

/// A running animated transition between two views
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFlight {
    pub from: OrbitView,
    pub to: OrbitView,
    pub elapsed: f32,
    pub duration: f32,
}

impl CameraFlight {
    /// Advance by `dt` seconds. Returns the eased view and whether the flight has finished.
    pub fn advance(&mut self, dt: f32) -> (OrbitView, bool) {
        self.elapsed += dt;
        let progress = if self.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.duration).min(1.0)
        };
        if progress >= 1.0 {
            (self.to, true)
        } else {
            (self.from.lerp(&self.to, smooth_step(progress)), false)
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct CameraState {
    pub view: OrbitView,
    pub home: OrbitView,
    pub flight: Option<CameraFlight>,
    pub flight_secs: f32,
}

impl CameraState {
    pub fn from_config(config: &AppConfig, frame: &LocalFrame) -> Self {
        let home = OrbitView {
            focus: frame.to_world(config.home.latitude, config.home.longitude, 0.0),
            yaw_deg: config.home.heading_deg,
            pitch_deg: config.home.pitch_deg.clamp(MIN_PITCH, MAX_PITCH),
            distance: config.home.range_m.clamp(MIN_DISTANCE, MAX_DISTANCE),
        };
        let overview = OrbitView {
            pitch_deg: MAX_PITCH,
            distance: (home.distance * OVERVIEW_RANGE_FACTOR).min(MAX_DISTANCE),
            ..home
        };
        Self {
            view: overview,
            home,
            flight: None,
            flight_secs: config.camera.flight_secs,
        }
    }

    /// Start flying home from wherever the camera is now. Replaces any running flight.
    pub fn fly_home(&mut self) {
        self.flight = Some(CameraFlight {
            from: self.view,
            to: self.home,
            elapsed: 0.0,
            duration: self.flight_secs,
        });
    }

    pub fn is_flying(&self) -> bool {
        self.flight.is_some()
    }
}

/// Smooth step function for easing transitions
fn smooth_step(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Startup system: spawns the camera at the overview and queues the initial flight home.
pub fn setup_camera(
    mut commands: Commands,
    config: Res<AppConfig>,
    frame: Res<LocalFrame>,
    mut fly_home: MessageWriter<FlyToHome>,
) {
    let state = CameraState::from_config(&config, &frame);

    commands.spawn((
        Name::new("Main Camera"),
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            far: CAMERA_FAR,
            ..default()
        }),
        state.view.transform(),
        MainCamera,
    ));

    commands.insert_resource(state);
    fly_home.write(FlyToHome);
}

/// Starts a home flight for the most recent request
pub fn start_home_flight(
    mut requests: MessageReader<FlyToHome>,
    mut state: ResMut<CameraState>,
) {
    if requests.read().last().is_some() {
        state.fly_home();
        info!("Flying to home view");
    }
}

pub fn animate_camera_flight(time: Res<Time>, mut state: ResMut<CameraState>) {
    let Some(mut flight) = state.flight else {
        return;
    };
    let (view, finished) = flight.advance(time.delta_secs());
    state.view = view;
    state.flight = if finished { None } else { Some(flight) };
}

/// Mouse controls.
///
/// - **Left drag**: orbit (yaw and pitch around the focus)
/// - **Right drag**: pan the focus along the ground
/// - **Scroll**: zoom
///
/// Any manual input cancels a running flight.
pub fn handle_camera_controls(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    mut scroll_events: MessageReader<MouseWheel>,
    mut state: ResMut<CameraState>,
    mut contexts: EguiContexts,
) {
    let over_ui = contexts
        .ctx_mut()
        .map(|ctx| ctx.is_pointer_over_area() || ctx.wants_pointer_input())
        .unwrap_or(false);
    if over_ui {
        mouse_motion.clear();
        scroll_events.clear();
        return;
    }

    let orbiting = mouse_button.pressed(MouseButton::Left);
    let panning = mouse_button.pressed(MouseButton::Right);
    let mut touched = false;

    if orbiting || panning {
        for event in mouse_motion.read() {
            if event.delta == Vec2::ZERO {
                continue;
            }
            touched = true;
            if orbiting {
                state.view.yaw_deg = (state.view.yaw_deg + event.delta.x * ORBIT_SENSITIVITY).rem_euclid(360.0);
                state.view.pitch_deg = (state.view.pitch_deg + event.delta.y * ORBIT_SENSITIVITY)
                    .clamp(MIN_PITCH, MAX_PITCH);
            } else {
                let (forward, right) = state.view.ground_basis();
                let speed = state.view.distance * PAN_SENSITIVITY;
                let offset = -right * event.delta.x * speed + forward * event.delta.y * speed;
                state.view.focus += offset;
            }
        }
    } else {
        mouse_motion.clear();
    }

    for event in scroll_events.read() {
        let scroll_y = match event.unit {
            MouseScrollUnit::Line => event.y,
            MouseScrollUnit::Pixel => event.y * 0.01,
        };
        if scroll_y == 0.0 {
            continue;
        }
        touched = true;
        state.view.distance = (state.view.distance * (1.0 - scroll_y * ZOOM_STEP))
            .clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    if touched && state.flight.take().is_some() {
        debug!("Camera flight cancelled by user input");
    }
}

pub fn apply_camera_transform(
    state: Res<CameraState>,
    mut camera_query: Query<&mut Transform, With<MainCamera>>,
) {
    if !state.is_changed() {
        return;
    }
    if let Ok(mut transform) = camera_query.single_mut() {
        *transform = state.view.transform();
    }
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<FlyToHome>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (
                    start_home_flight,
                    handle_camera_controls,
                    animate_camera_flight,
                    apply_camera_transform,
                )
                    .chain(),
            );
    }
}
