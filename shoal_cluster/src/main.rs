//! `shoal-driver`: the binary every node in a cluster runs identically.
//! Bootstraps a `DriverContext` from the host file and CLI arguments; the
//! master node additionally runs a small smoke-test job so an operator can
//! confirm the cluster reduces and collects correctly end to end.
//!
//! Loading and dispatching actual user jobs is left to an external
//! bootstrapping helper; this binary only proves the wiring.

use shoal_cluster::driver::DriverContext;
use shoal_common::config::DriverArgs;
use shoal_common::hostfile;
use shoal_job::iter_seq::IteratorSeq;
use std::thread;
use std::time::Duration;
use tracing::info;

fn main() {
    shoal_common::logging::init();

    let DriverArgs {
        hosts_file_path,
        master_address,
        listen_port,
    } = DriverArgs::parse_args();

    let hosts = match hostfile::read_file(&hosts_file_path) {
        Ok(hosts) => hosts,
        Err(error) => {
            tracing::error!(%error, hosts_file_path, "failed to read host file");
            std::process::exit(1);
        }
    };

    let ctx = match DriverContext::new(hosts, &master_address, listen_port) {
        Ok(ctx) => ctx,
        Err(error) => {
            tracing::error!(%error, listen_port, "failed to start driver context");
            std::process::exit(1);
        }
    };

    info!(listen_port, is_master = ctx.is_master(), "shoal node started");

    if ctx.is_master() {
        let rdd = ctx.parallelize(IteratorSeq::range(1i64, 100, 1), ctx.hosts().len().max(1));
        let sum = ctx.reduce(&rdd, |a, b| a + b);
        info!(?sum, "smoke-test job complete");
    }

    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
