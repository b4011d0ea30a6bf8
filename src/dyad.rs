use crate::{Force, Position, role::Role};

/// The two cursors as seen by one end of the dyad.
///
/// `local` is only ever written from a device read, `remote` only from a
/// frame received from the peer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorPair {
    pub local: Position,
    pub remote: Position,
}

impl Default for CursorPair {
    fn default() -> Self {
        CursorPair {
            local: Position::zeros(),
            remote: Position::zeros(),
        }
    }
}

impl CursorPair {
    pub fn host(&self, role: Role) -> Position {
        match role {
            Role::Host => self.local,
            Role::Client => self.remote,
        }
    }

    pub fn client(&self, role: Role) -> Position {
        match role {
            Role::Host => self.remote,
            Role::Client => self.local,
        }
    }

    /// `client - host`, identical on both ends for the same pair of positions
    pub fn client_minus_host(&self, role: Role) -> Position {
        self.client(role) - self.host(role)
    }
}

/// Outcome of one evaluation of the force model
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub distance: f64,
    pub touching: bool,
    /// Signed overlap depth, negative while overlapping; None when apart
    pub penetration: Option<f64>,
    /// Force in workspace axes; device-axis conventions are applied later
    pub force: Force,
}

impl Interaction {
    fn apart(distance: f64) -> Self {
        Interaction {
            distance,
            touching: false,
            penetration: None,
            force: Force::zeros(),
        }
    }
}

/// Penetration-based spring between two circular cursor footprints
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceModel {
    pub workspace_scale: f64,
    pub cursor_radius: f64,
    pub stiffness: f64,
}

impl Default for ForceModel {
    fn default() -> Self {
        ForceModel {
            workspace_scale: 250.,
            cursor_radius: 40.,
            stiffness: 10.,
        }
    }
}

impl ForceModel {
    /// Centre-to-centre distance (workspace units) at which the disks just touch
    pub fn contact_distance(&self) -> f64 {
        2. * self.cursor_radius / self.workspace_scale
    }

    /// Coincident cursors (distance 0) are deliberately not touching: there
    /// is no direction to push along.
    pub fn is_touching(&self, distance: f64) -> bool {
        distance > 0. && distance * self.workspace_scale <= 2. * self.cursor_radius
    }

    pub fn penetration(&self, distance: f64) -> f64 {
        distance - self.contact_distance()
    }

    pub fn evaluate(&self, role: Role, cursors: &CursorPair) -> Interaction {
        let diff = cursors.client_minus_host(role);
        let distance = diff.norm();

        if !self.is_touching(distance) {
            return Interaction::apart(distance);
        }

        let penetration = self.penetration(distance);
        let surface = diff / distance * penetration * self.stiffness * role.spring_sign();

        Interaction {
            distance,
            touching: true,
            penetration: Some(penetration),
            force: Force::new(surface.x, surface.y, 0.),
        }
    }
}
