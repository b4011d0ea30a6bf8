use std::{cell::RefCell, rc::Rc};

use egui::{Key, Pos2};
use log::{info, warn};

use falcon_dyad::{
    Position,
    device::{DeviceAxes, simulated::PointerHandle},
    dyad::Interaction,
    dyad_config::DyadConfig,
    error::DyadError,
    session::{FrameClock, QuitSignal, Session, SessionState},
};

use crate::ui::render_ui;

#[cfg(feature = "falcon")]
pub type Driver = falcon_dyad::device::falcon::FalconDriver;

#[cfg(not(feature = "falcon"))]
pub type Driver = falcon_dyad::device::simulated::PointerDriver;

#[cfg(feature = "falcon")]
pub fn open_driver() -> (Driver, Option<PointerHandle>) {
    (Driver::new(), None)
}

#[cfg(not(feature = "falcon"))]
pub fn open_driver() -> (Driver, Option<PointerHandle>) {
    let (driver, handle) = Driver::new();
    (driver, Some(handle))
}

pub struct Model {
    pub session: Session<Driver>,
    pub workspace_scale: f32,
    pub cursor_radius: f32,
    pub last_interaction: Option<Interaction>,
    /// Screen position of the workspace origin, as last drawn
    pub centre: Pos2,
    pointer: Option<PointerHandle>,
    axes: DeviceAxes,
    clock: FrameClock,
    quit: QuitSignal,
    failure: Rc<RefCell<Option<DyadError>>>,
}

impl Model {
    pub fn new(
        session: Session<Driver>,
        pointer: Option<PointerHandle>,
        config: &DyadConfig,
        quit: QuitSignal,
        failure: Rc<RefCell<Option<DyadError>>>,
    ) -> Result<Self, DyadError> {
        let half = config.window_size / 2.;
        Ok(Model {
            session,
            workspace_scale: config.workspace_scale as f32,
            cursor_radius: config.cursor_radius as f32,
            last_interaction: None,
            centre: Pos2::new(half, half),
            pointer,
            axes: config.device_axes,
            clock: FrameClock::new(config.target_fps)?,
            quit,
            failure,
        })
    }

    pub fn to_screen(&self, p: &Position) -> Pos2 {
        Pos2::new(
            self.centre.x + p.x as f32 * self.workspace_scale,
            self.centre.y + p.y as f32 * self.workspace_scale,
        )
    }

    fn to_workspace(&self, screen: Pos2) -> Position {
        Position::new(
            ((screen.x - self.centre.x) / self.workspace_scale) as f64,
            ((screen.y - self.centre.y) / self.workspace_scale) as f64,
        )
    }

    fn follow_pointer(&self, ctx: &egui::Context) {
        if let (Some(handle), Some(pos)) = (&self.pointer, ctx.pointer_hover_pos()) {
            handle.set(self.axes.to_device(&self.to_workspace(pos)));
        }
    }
}

impl eframe::App for Model {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        if self.session.state() == SessionState::Running {
            self.follow_pointer(ctx);
            self.clock.tick();
            match self.session.tick() {
                Ok(interaction) => self.last_interaction = Some(interaction),
                Err(e) => {
                    *self.failure.borrow_mut() = Some(e);
                    frame.close();
                }
            }
        }

        render_ui(ctx, self);

        if ctx.input(|i| i.key_pressed(Key::Escape)) || self.quit.is_requested() {
            info!("Quit requested");
            frame.close();
        }

        ctx.request_repaint();
    }

    fn on_close_event(&mut self) -> bool {
        if self.session.state() == SessionState::Running {
            self.session.disconnect();
        } else {
            warn!("Window closing after session already ended");
        }
        true
    }
}
