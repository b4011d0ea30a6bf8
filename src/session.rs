use std::{
    io::ErrorKind,
    net::SocketAddr,
    process,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, info, trace, warn};

use crate::{
    device::{DeviceAdapter, HapticDriver},
    dyad::{CursorPair, ForceModel, Interaction},
    dyad_config::{DyadConfig, frame_period},
    error::{DyadError, Result},
    link::{LinkChannel, LinkOptions},
    role::Role,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Only while `Session::connect` waits for the link; a `Session` value
    /// never reports it, since one exists only once the link is up
    Connecting,
    Running,
    /// Terminal: link closed, device released
    Disconnecting,
}

/// Consumes the cursors once per tick, read-only
pub trait Presenter {
    fn present(&mut self, role: Role, cursors: &CursorPair, interaction: &Interaction);

    fn quit_requested(&self) -> bool;
}

/// A quit request raised outside the tick loop, e.g. by Ctrl-C. Clones share
/// the same flag.
#[derive(Debug, Clone, Default)]
pub struct QuitSignal(Arc<AtomicBool>);

impl QuitSignal {
    pub fn new() -> Self {
        QuitSignal::default()
    }

    /// Raise the flag on SIGINT or SIGTERM so the tick loop can tear down.
    /// A second signal before that happens exits immediately.
    pub fn on_interrupt() -> std::result::Result<Self, ctrlc::Error> {
        let signal = QuitSignal::new();
        let handler = signal.clone();
        ctrlc::set_handler(move || {
            if handler.request() {
                warn!("Interrupted again; exiting without teardown");
                process::exit(130);
            }
            warn!("Interrupted; stopping after the current tick (interrupt again to exit now)");
        })?;
        Ok(signal)
    }

    /// Raise the flag; returns whether it was already raised
    pub fn request(&self) -> bool {
        self.0.swap(true, Ordering::SeqCst)
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Best-effort fixed-rate frame pacing
pub struct FrameClock {
    frame: Duration,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new(target_fps: f64) -> Result<Self> {
        Ok(FrameClock {
            frame: frame_period(target_fps)?,
            last: None,
        })
    }

    /// Sleep until at least one frame has passed since the previous call,
    /// then return the time that actually elapsed (zero on the first call).
    pub fn tick(&mut self) -> Duration {
        let Some(last) = self.last else {
            self.last = Some(Instant::now());
            return Duration::ZERO;
        };
        let elapsed = last.elapsed();
        if elapsed < self.frame {
            thread::sleep(self.frame - elapsed);
        }
        let now = Instant::now();
        self.last = Some(now);
        now - last
    }
}

/// One end of a running dyad: the link to the peer, the local device, and
/// the pair of cursors they feed.
pub struct Session<D: HapticDriver> {
    role: Role,
    state: SessionState,
    link: LinkChannel,
    device: DeviceAdapter<D>,
    cursors: CursorPair,
    model: ForceModel,
    touching: bool,
    ticks: u64,
}

impl<D: HapticDriver> Session<D> {
    /// Establish the link for `role` (host: listen on `addr` for one peer;
    /// client: connect to `addr`). The device is released if this fails.
    pub fn connect(
        role: Role,
        mut device: DeviceAdapter<D>,
        addr: SocketAddr,
        config: &DyadConfig,
    ) -> Result<Self> {
        debug!("Session state: {:?}", SessionState::Connecting);
        let options = LinkOptions {
            timeout: config.link_timeout(),
        };
        let link = match role {
            Role::Host => LinkChannel::connect_as_host(addr, options),
            Role::Client => LinkChannel::connect_as_client(addr, options),
        };
        match link {
            Ok(link) => Ok(Session::new(device, link, config)),
            Err(e) => {
                device.shutdown();
                Err(e)
            }
        }
    }

    /// Start running over an already-established link. The role is the
    /// link's role.
    pub fn new(device: DeviceAdapter<D>, link: LinkChannel, config: &DyadConfig) -> Self {
        let role = link.role();
        info!("Session running as {} with peer {}", role, link.peer_addr());
        Session {
            role,
            state: SessionState::Running,
            link,
            device,
            cursors: CursorPair::default(),
            model: config.force_model(),
            touching: false,
            ticks: 0,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn cursors(&self) -> &CursorPair {
        &self.cursors
    }

    pub fn model(&self) -> &ForceModel {
        &self.model
    }

    pub fn device(&self) -> &DeviceAdapter<D> {
        &self.device
    }

    /// Ticks completed successfully
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// One tick: exchange positions with the peer, read the device, then
    /// compute and apply the force. Any failure ends the session; teardown
    /// has already happened by the time the error is returned.
    pub fn tick(&mut self) -> Result<Interaction> {
        if self.state != SessionState::Running {
            return Err(DyadError::LinkLost(ErrorKind::NotConnected.into()));
        }
        match self.step() {
            Ok(interaction) => Ok(interaction),
            Err(e) => {
                error!("Session ending after {} ticks: {}", self.ticks, e);
                self.disconnect();
                Err(e)
            }
        }
    }

    fn step(&mut self) -> Result<Interaction> {
        self.cursors.remote = self.link.exchange(&self.cursors.local)?;

        self.device.pump()?;
        self.cursors.local = self.device.read_position();

        let interaction = self.model.evaluate(self.role, &self.cursors);
        self.device.apply_force(&interaction.force);

        if interaction.touching != self.touching {
            self.touching = interaction.touching;
            if interaction.touching {
                info!("touching");
            } else {
                info!("apart");
            }
        }
        if let Some(penetration) = interaction.penetration {
            debug!(
                "penetration {:.4}, force ({:.3}, {:.3})",
                penetration, interaction.force.x, interaction.force.y
            );
        }

        self.ticks += 1;
        Ok(interaction)
    }

    /// Tick until the presenter asks to quit or something fails. The session
    /// is always disconnected on return. Returns the number of ticks run.
    pub fn run<P: Presenter>(&mut self, presenter: &mut P, clock: &mut FrameClock) -> Result<u64> {
        let result = loop {
            let dt = clock.tick();
            trace!("frame dt {:.1}ms", dt.as_secs_f64() * 1000.);
            match self.tick() {
                Ok(interaction) => {
                    presenter.present(self.role, &self.cursors, &interaction);
                    if presenter.quit_requested() {
                        info!("Quit requested after {} ticks", self.ticks);
                        break Ok(self.ticks);
                    }
                }
                Err(e) => break Err(e),
            }
        };
        self.disconnect();
        result
    }

    /// Close the link, then release the device. Safe to call again.
    pub fn disconnect(&mut self) {
        if self.state == SessionState::Disconnecting {
            return;
        }
        info!("disconnecting");
        self.state = SessionState::Disconnecting;
        self.link.close();
        self.device.shutdown();
    }
}

impl<D: HapticDriver> Drop for Session<D> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Headless presentation: a periodic log line, an optional tick limit, and
/// an external quit signal
pub struct LogPresenter {
    max_ticks: Option<u64>,
    report_every: u64,
    presented: u64,
    quit: QuitSignal,
}

impl LogPresenter {
    pub fn new(max_ticks: Option<u64>, report_every: u64) -> Self {
        LogPresenter {
            max_ticks,
            report_every: report_every.max(1),
            presented: 0,
            quit: QuitSignal::new(),
        }
    }

    pub fn with_quit_signal(mut self, quit: QuitSignal) -> Self {
        self.quit = quit;
        self
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Presenter for LogPresenter {
    fn present(&mut self, role: Role, cursors: &CursorPair, interaction: &Interaction) {
        self.presented += 1;
        if self.presented % self.report_every == 0 {
            let host = cursors.host(role);
            let client = cursors.client(role);
            info!(
                "host ({:.3}, {:.3}) client ({:.3}, {:.3}) distance {:.3}{}",
                host.x,
                host.y,
                client.x,
                client.y,
                interaction.distance,
                if interaction.touching { " [touching]" } else { "" }
            );
        }
    }

    fn quit_requested(&self) -> bool {
        self.quit.is_requested() || self.max_ticks.is_some_and(|max| self.presented >= max)
    }
}
