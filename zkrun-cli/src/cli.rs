use clap::Parser;
use std::path::PathBuf;
use zkrun_config::DEFAULT_CONFIG_PATH;

#[derive(Parser, Debug)]
#[command(name = "zkrun")]
#[command(version)]
#[command(about = "Run a command exactly once across hosts under a ZooKeeper lock")]
#[command(long_about = "
zkrun runs a job on exactly one of the hosts sharing a sync group. Every host
starts zkrun with the same job; the instances contend for a lock in ZooKeeper
and the winner runs the job command, with hooks around it. The job's exit
policy decides whether the winner gives up the lock and contends again.

Example usage:
  zkrun --job backup                               # /etc/zkrun/jobspec/backup.conf
  zkrun -c /etc/zkrun/staging.conf -j backup       # Alternate service config
  zkrun -j /srv/jobs/rotate.conf                   # Job spec by absolute path
")]
pub struct Cli {
    /// Service configuration file
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Job name below /etc/zkrun/jobspec, or an absolute job spec path
    #[arg(short = 'j', long = "job")]
    pub job: String,
}

impl Cli {
    pub fn try_parse_from_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(args)
    }
}
