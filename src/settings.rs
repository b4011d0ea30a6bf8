use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::role::Role;

// Some defaults; some of which can be overriden via CLI args
const CONFIG_FILE_PATH: &str = "./dyad.json";
const SOCKET_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
const SOCKET_PORT: u16 = 65432;

#[derive(Parser, Debug)]
#[command(version, about = "Falcon Dyad Program", long_about = None)]
pub struct Cli {
    /// Act as client, connect to host
    #[arg(short = 'c', long = "client")]
    pub client: bool,

    /// Socket IP: the address to bind (host) or to connect to (client)
    #[arg(short = 'i', long = "ip", default_value_t = SOCKET_IP)]
    pub ip: IpAddr,

    /// Socket port
    #[arg(short = 'p', long = "port", default_value_t = SOCKET_PORT)]
    pub port: u16,

    /// Novint Falcon device number (defaults 0 for host, 1 for client)
    #[arg(short = 'd', long = "device")]
    pub device: Option<usize>,

    /// Where to load optional workspace/device config
    #[arg(long = "config", default_value_t = String::from(CONFIG_FILE_PATH))]
    pub config_path: String,

    #[arg(long = "loglevel", default_value_t = String::from("info"))]
    pub log_level: String,

    /// Headless only: stop after this many ticks
    #[arg(long = "ticks")]
    pub ticks: Option<u64>,
}

impl Cli {
    pub fn role(&self) -> Role {
        Role::from_client_flag(self.client)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}
