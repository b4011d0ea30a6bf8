use std::fmt;

/// Which end of the dyad this process is. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Owns the listening side, and always sends first each tick
    Host,
    /// Connects to the host, and always receives first each tick
    Client,
}

impl Role {
    pub fn from_client_flag(is_client: bool) -> Self {
        if is_client { Role::Client } else { Role::Host }
    }

    /// With two devices plugged into one machine, each role picks its own
    pub fn default_device_index(&self) -> usize {
        match self {
            Role::Host => 0,
            Role::Client => 1,
        }
    }

    /// Device indicator (r, g, b)
    pub fn led_colour(&self) -> (bool, bool, bool) {
        match self {
            Role::Host => (true, false, false),
            Role::Client => (false, false, true),
        }
    }

    /// Sign applied to the spring law so that both ends, evaluating the same
    /// `client - host` difference, produce opposite forces.
    pub fn spring_sign(&self) -> f64 {
        match self {
            Role::Host => -1.0,
            Role::Client => 1.0,
        }
    }

    pub fn caption(&self) -> &'static str {
        match self {
            Role::Host => "Dyad Task HOST",
            Role::Client => "Dyad Task CLIENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => write!(f, "host"),
            Role::Client => write!(f, "client"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_pick_distinct_devices_and_colours() {
        assert_eq!(Role::Host.default_device_index(), 0);
        assert_eq!(Role::Client.default_device_index(), 1);
        assert_eq!(Role::Host.led_colour(), (true, false, false));
        assert_eq!(Role::Client.led_colour(), (false, false, true));
    }

    #[test]
    fn spring_signs_are_opposite() {
        assert_eq!(Role::Host.spring_sign(), -Role::Client.spring_sign());
    }

    #[test]
    fn client_flag() {
        assert_eq!(Role::from_client_flag(true), Role::Client);
        assert_eq!(Role::from_client_flag(false), Role::Host);
    }
}
