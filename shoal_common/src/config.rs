//! Command line arguments for the shoal driver binary.

use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
/// Command line arguments shared by every node in a shoal cluster.
///
/// Every host in the host file runs this same binary; the node decides
/// whether it is acting as master or worker by comparing `master_address`
/// against its own address (see `shoal_cluster::scheduler::is_master`).
pub struct DriverArgs {
    /// path to the host list file (one `address threads memory listen-port` per line)
    pub hosts_file_path: String,

    /// address of the master node, or "local" to run single-node
    pub master_address: String,

    /// port this node listens on for scheduler messages
    pub listen_port: u16,
}

impl DriverArgs {
    pub fn parse_args() -> Self {
        DriverArgs::parse()
    }
}
